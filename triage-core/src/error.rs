//! Error types for decoding stream and model payloads

use thiserror::Error;

/// Errors raised while decoding wire payloads
///
/// Record-level variants carry the zero-based index of the offending record.
/// None of these are recoverable: a batch with one bad record is rejected whole.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The event document does not have the stream envelope shape
    #[error("stream event envelope is malformed: {0}")]
    Envelope(#[source] serde_json::Error),

    /// The stream event carried no records
    #[error("stream event contains no records")]
    EmptyBatch,

    /// Record payload is not valid base64
    #[error("record {index}: payload is not valid base64: {source}")]
    Base64 {
        index: usize,
        source: base64::DecodeError,
    },

    /// Record payload is not valid UTF-8
    #[error("record {index}: payload is not valid UTF-8: {source}")]
    Utf8 {
        index: usize,
        source: std::string::FromUtf8Error,
    },

    /// Record payload is not a JSON document
    #[error("record {index}: payload is not valid JSON: {source}")]
    Json {
        index: usize,
        source: serde_json::Error,
    },

    /// Record payload has no string `message` field
    #[error("record {index}: payload has no string field `message`")]
    MissingMessage { index: usize },

    /// A model stream line is not a JSON frame
    #[error("stream frame is not valid JSON: {0}")]
    Frame(#[source] serde_json::Error),

    /// A model stream chunk is not valid base64
    #[error("stream chunk is not valid base64: {0}")]
    FrameEncoding(#[source] base64::DecodeError),

    /// A model response chunk is not valid UTF-8
    #[error("response chunk is not valid UTF-8: {0}")]
    ChunkEncoding(#[source] std::string::FromUtf8Error),
}

impl DecodeError {
    /// Index of the failing record, for record-level errors
    pub fn record_index(&self) -> Option<usize> {
        match self {
            Self::Base64 { index, .. }
            | Self::Utf8 { index, .. }
            | Self::Json { index, .. }
            | Self::MissingMessage { index } => Some(*index),
            _ => None,
        }
    }
}
