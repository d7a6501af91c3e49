//! Reasoning model client
//!
//! The model answers either with a single payload or with a newline-delimited
//! stream of [`StreamFrame`]s. Both are exposed as a [`ModelResponse`]; callers
//! that only care about the text can flatten either mode with
//! [`ModelResponse::into_chunks`].

use bytes::Bytes;
use futures::stream::{self, BoxStream, Stream, StreamExt};
use reqwest::Client;
use tracing::debug;
use triage_core::dto::model::{InferenceRequest, StreamFrame};

use crate::error::{ClientError, Result};
use crate::{check_status, normalize_base_url};

/// Lazily decoded chunk payloads, in arrival order
pub type ChunkStream = BoxStream<'static, Result<Bytes>>;

/// Response channel of one model invocation
pub enum ModelResponse {
    /// The whole completion in one body
    Payload(Bytes),
    /// Chunks delivered until the service closes the stream
    Stream(ChunkStream),
}

impl ModelResponse {
    /// Views either delivery mode as a chunk sequence; a payload is one chunk
    pub fn into_chunks(self) -> ChunkStream {
        match self {
            Self::Payload(payload) => stream::once(async move { Ok(payload) }).boxed(),
            Self::Stream(chunks) => chunks,
        }
    }
}

impl std::fmt::Debug for ModelResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Payload(payload) => f.debug_tuple("Payload").field(payload).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// HTTP client for the model service
#[derive(Debug, Clone)]
pub struct ModelClient {
    base_url: String,
    client: Client,
}

impl ModelClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Invokes the model and waits for the complete body
    pub async fn invoke(&self, model_id: &str, request: &InferenceRequest) -> Result<ModelResponse> {
        let url = format!("{}/model/{}/invoke", self.base_url, model_id);
        let response = self.client.post(&url).json(request).send().await?;

        let payload = check_status(response).await?.bytes().await?;
        debug!("Model {} returned {} bytes", model_id, payload.len());

        Ok(ModelResponse::Payload(payload))
    }

    /// Invokes the model and returns its chunks as they arrive
    ///
    /// A status error is reported here; errors after the stream has started
    /// surface as the last item of the [`ChunkStream`].
    pub async fn invoke_stream(
        &self,
        model_id: &str,
        request: &InferenceRequest,
    ) -> Result<ModelResponse> {
        let url = format!("{}/model/{}/invoke-with-response-stream", self.base_url, model_id);
        let response = self.client.post(&url).json(request).send().await?;

        let response = check_status(response).await?;
        debug!("Model {} opened response stream", model_id);

        Ok(ModelResponse::Stream(frame_chunks(Box::pin(
            response.bytes_stream(),
        ))))
    }
}

// =============================================================================
// Stream Framing
// =============================================================================

/// Splits a byte stream into lines regardless of network chunk boundaries
struct LineFramer<S> {
    body: S,
    buffer: Vec<u8>,
    exhausted: bool,
    failed: bool,
}

impl<S, E> LineFramer<S>
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Unpin,
    E: Into<ClientError>,
{
    fn take_line(&mut self) -> Option<Vec<u8>> {
        let end = self.buffer.iter().position(|byte| *byte == b'\n')?;
        let mut line: Vec<u8> = self.buffer.drain(..=end).collect();
        line.pop();
        Some(line)
    }

    /// Next non-blank line; `None` once the body is exhausted
    async fn next_line(&mut self) -> Option<Result<Vec<u8>>> {
        loop {
            if let Some(line) = self.take_line() {
                if is_blank(&line) {
                    continue;
                }
                return Some(Ok(line));
            }

            if self.exhausted {
                let rest = std::mem::take(&mut self.buffer);
                return (!is_blank(&rest)).then_some(Ok(rest));
            }

            match self.body.next().await {
                Some(Ok(bytes)) => self.buffer.extend_from_slice(&bytes),
                Some(Err(err)) => {
                    self.exhausted = true;
                    self.buffer.clear();
                    return Some(Err(err.into()));
                }
                None => self.exhausted = true,
            }
        }
    }
}

fn is_blank(line: &[u8]) -> bool {
    line.iter().all(u8::is_ascii_whitespace)
}

/// Decodes one frame line into a chunk payload; keep-alive frames yield `None`
fn decode_frame(line: &[u8]) -> Result<Option<Bytes>> {
    let frame = StreamFrame::parse(line)?;

    if let Some(error) = frame.error {
        return Err(ClientError::Stream(error.message));
    }

    match frame.chunk {
        Some(chunk) => Ok(Some(Bytes::from(chunk.decode()?))),
        None => Ok(None),
    }
}

/// Turns a newline-delimited frame body into a [`ChunkStream`]
///
/// The stream ends after the first error.
fn frame_chunks<S, E>(body: S) -> ChunkStream
where
    S: Stream<Item = std::result::Result<Bytes, E>> + Send + Unpin + 'static,
    E: Into<ClientError> + Send + 'static,
{
    let framer = LineFramer {
        body,
        buffer: Vec::new(),
        exhausted: false,
        failed: false,
    };

    stream::unfold(framer, |mut framer| async move {
        if framer.failed {
            return None;
        }

        loop {
            let line = match framer.next_line().await? {
                Ok(line) => line,
                Err(err) => {
                    framer.failed = true;
                    return Some((Err(err), framer));
                }
            };

            match decode_frame(&line) {
                Ok(Some(payload)) => return Some((Ok(payload), framer)),
                Ok(None) => continue,
                Err(err) => {
                    framer.failed = true;
                    return Some((Err(err), framer));
                }
            }
        }
    })
    .boxed()
}
