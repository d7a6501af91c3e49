//! Model service DTOs
//!
//! Request body for the reasoning model, the line frames of a streamed
//! response, and decoding of individual response chunks into text.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DecodeError;
use crate::prompt::Prompt;

/// Fixed sampling parameters sent with every prompt
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InferenceParameters {
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for InferenceParameters {
    fn default() -> Self {
        Self {
            max_tokens: 100,
            temperature: 0.7,
        }
    }
}

/// Body of a model invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceRequest {
    pub prompt: String,
    pub max_tokens_to_sample: u32,
    pub temperature: f32,
}

impl InferenceRequest {
    pub fn new(prompt: &Prompt, parameters: InferenceParameters) -> Self {
        Self {
            prompt: prompt.as_str().to_string(),
            max_tokens_to_sample: parameters.max_tokens,
            temperature: parameters.temperature,
        }
    }
}

/// One line of a streamed model response
///
/// Carries either a chunk or a service error. Frames with neither are keep-alives.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFrame {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk: Option<FrameChunk>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<FrameError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameChunk {
    /// Base64-encoded chunk payload
    pub bytes: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameError {
    pub message: String,
}

impl StreamFrame {
    pub fn parse(line: &[u8]) -> Result<Self, DecodeError> {
        serde_json::from_slice(line).map_err(DecodeError::Frame)
    }

    pub fn chunk(payload: impl AsRef<[u8]>) -> Self {
        Self {
            chunk: Some(FrameChunk {
                bytes: STANDARD.encode(payload),
            }),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            chunk: None,
            error: Some(FrameError {
                message: message.into(),
            }),
        }
    }

    /// Newline-terminated JSON rendering, as written on the wire
    pub fn to_line(&self) -> String {
        let mut line = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        line.push('\n');
        line
    }
}

impl FrameChunk {
    pub fn decode(&self) -> Result<Vec<u8>, DecodeError> {
        STANDARD
            .decode(self.bytes.as_bytes())
            .map_err(DecodeError::FrameEncoding)
    }
}

/// Extracts the text carried by one response chunk
///
/// - JSON object: its `text` field, else `completion`, else empty (metadata chunk)
/// - JSON string: the string itself
/// - anything else: the payload verbatim
pub fn chunk_text(payload: &[u8]) -> Result<String, DecodeError> {
    let raw = String::from_utf8(payload.to_vec()).map_err(DecodeError::ChunkEncoding)?;

    let text = match serde_json::from_str::<Value>(&raw) {
        Ok(Value::Object(object)) => ["text", "completion"]
            .iter()
            .find_map(|field| object.get(*field).and_then(Value::as_str))
            .unwrap_or_default()
            .to_string(),
        Ok(Value::String(text)) => text,
        _ => raw,
    };

    Ok(text)
}
