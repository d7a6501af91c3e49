//! Log domain types

use serde::{Deserialize, Serialize};

/// A log record pushed onto the stream by a producer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub message: String,
}

impl LogEntry {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Log entries decoded from one stream event, in delivery order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogBatch {
    entries: Vec<LogEntry>,
}

impl LogBatch {
    pub fn new(entries: Vec<LogEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Joins every message with a single space, keeping delivery order
    pub fn joined_messages(&self) -> String {
        self.entries
            .iter()
            .map(|entry| entry.message.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl FromIterator<LogEntry> for LogBatch {
    fn from_iter<I: IntoIterator<Item = LogEntry>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
