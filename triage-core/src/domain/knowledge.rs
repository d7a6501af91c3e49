//! Knowledge base domain type

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reference document that gives the model context about the system
///
/// Always a JSON object. Loading failures are represented by [`KnowledgeBase::empty`],
/// never by an error, so prompt construction can rely on a well-formed mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KnowledgeBase(Map<String, Value>);

impl KnowledgeBase {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses a JSON document; anything other than an object is rejected
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Compact JSON rendering used inside prompts
    pub fn to_json(&self) -> String {
        // A string-keyed map of JSON values always serializes.
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

impl From<Map<String, Value>> for KnowledgeBase {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
