//! Stream event DTOs
//!
//! The envelope delivered by the stream trigger, and the batch decoder that
//! turns it into a [`LogBatch`].

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::domain::log::{LogBatch, LogEntry};
use crate::error::DecodeError;

/// A batch of stream records handed to one invocation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<StreamRecord>,
}

/// One record of a stream event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamRecord {
    #[serde(rename = "eventID", default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(
        rename = "eventSourceARN",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub event_source_arn: Option<String>,
    pub kinesis: RecordPayload,
}

/// Transport payload of a record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPayload {
    /// Base64-encoded UTF-8 JSON document
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<String>,
}

/// Idempotency key identifying one delivered batch
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchKey(String);

impl BatchKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BatchKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl StreamRecord {
    /// Encodes an entry the way a producer puts it on the stream
    pub fn from_entry(entry: &LogEntry, partition_key: impl Into<String>) -> Self {
        let document = serde_json::json!({ "message": entry.message });
        Self {
            event_id: None,
            event_source_arn: None,
            kinesis: RecordPayload {
                data: STANDARD.encode(document.to_string()),
                partition_key: Some(partition_key.into()),
                sequence_number: None,
            },
        }
    }

    /// Decodes base64 → UTF-8 → JSON → `message`
    pub fn decode(&self, index: usize) -> Result<LogEntry, DecodeError> {
        let bytes = STANDARD
            .decode(self.kinesis.data.as_bytes())
            .map_err(|source| DecodeError::Base64 { index, source })?;

        let text = String::from_utf8(bytes).map_err(|source| DecodeError::Utf8 { index, source })?;

        let document: Value =
            serde_json::from_str(&text).map_err(|source| DecodeError::Json { index, source })?;

        match document.get("message") {
            Some(Value::String(message)) => Ok(LogEntry::new(message.clone())),
            _ => Err(DecodeError::MissingMessage { index }),
        }
    }

    fn identity(&self) -> &str {
        self.event_id.as_deref().unwrap_or(&self.kinesis.data)
    }
}

impl StreamEvent {
    /// Reads the envelope from a raw event document
    pub fn from_value(document: Value) -> Result<Self, DecodeError> {
        serde_json::from_value(document).map_err(DecodeError::Envelope)
    }

    /// Builds an event from entries, one record per entry
    pub fn from_entries<'a>(
        entries: impl IntoIterator<Item = &'a LogEntry>,
        partition_key: &str,
    ) -> Self {
        Self {
            records: entries
                .into_iter()
                .map(|entry| StreamRecord::from_entry(entry, partition_key))
                .collect(),
        }
    }

    /// Decodes every record in delivery order
    ///
    /// The first malformed record fails the whole batch.
    pub fn decode_batch(&self) -> Result<LogBatch, DecodeError> {
        if self.records.is_empty() {
            return Err(DecodeError::EmptyBatch);
        }

        self.records
            .iter()
            .enumerate()
            .map(|(index, record)| record.decode(index))
            .collect()
    }

    /// SHA-256 over record identities (event id, or raw payload when absent)
    pub fn batch_key(&self) -> BatchKey {
        let mut hasher = Sha256::new();
        for (position, record) in self.records.iter().enumerate() {
            if position > 0 {
                hasher.update(b"\n");
            }
            hasher.update(record.identity().as_bytes());
        }

        let digest = hasher.finalize();
        BatchKey(digest.iter().map(|byte| format!("{byte:02x}")).collect())
    }
}
