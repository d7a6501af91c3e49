//! Analysis and verdict domain types

use serde::{Deserialize, Serialize};

/// Token whose presence in the analysis triggers remediation
pub const REMEDIATION_TRIGGER: &str = "restart";

/// Full model output for one invocation, chunks concatenated in arrival order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisResult(String);

impl AnalysisResult {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Appends one decoded chunk
    pub fn push_fragment(&mut self, fragment: &str) {
        self.0.push_str(fragment);
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn verdict(&self) -> RemediationVerdict {
        RemediationVerdict::from_analysis(&self.0)
    }
}

/// Binary remediation decision derived from the analysis text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RemediationVerdict {
    Remediate,
    NoAction,
}

impl RemediationVerdict {
    /// Case-insensitive substring match on [`REMEDIATION_TRIGGER`].
    ///
    /// Negated mentions ("no restart needed") still match. Callers depend on
    /// this exact behavior; changing it is a contract change.
    pub fn from_analysis(text: &str) -> Self {
        if text.to_lowercase().contains(REMEDIATION_TRIGGER) {
            Self::Remediate
        } else {
            Self::NoAction
        }
    }

    pub fn requires_action(self) -> bool {
        matches!(self, Self::Remediate)
    }
}

impl std::fmt::Display for RemediationVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Remediate => write!(f, "remediate"),
            Self::NoAction => write!(f, "no-action"),
        }
    }
}
