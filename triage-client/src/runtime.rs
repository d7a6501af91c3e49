//! Hosting runtime API client
//!
//! The runtime hands out one invocation at a time and expects exactly one
//! response or error document back for it.

use reqwest::Client;
use serde_json::Value as JsonValue;
use triage_core::dto::invocation::{InvocationError, InvocationResponse};

use crate::error::{ClientError, Result};
use crate::{check_status, handle_empty_response, normalize_base_url};

const API_VERSION: &str = "2018-06-01";

/// Header carrying the invocation id
pub const REQUEST_ID_HEADER: &str = "Lambda-Runtime-Aws-Request-Id";

/// Header carrying the invocation deadline in epoch milliseconds
pub const DEADLINE_HEADER: &str = "Lambda-Runtime-Deadline-Ms";

/// An invocation handed out by the runtime
#[derive(Debug, Clone)]
pub struct Invocation {
    pub request_id: String,
    /// Epoch milliseconds after which the runtime abandons the invocation
    pub deadline_ms: Option<i64>,
    /// Raw event document; decoding is the pipeline's job
    pub event: JsonValue,
}

/// HTTP client for the hosting runtime API
#[derive(Debug, Clone)]
pub struct RuntimeClient {
    base_url: String,
    client: Client,
}

impl RuntimeClient {
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

    /// Blocks until the runtime has an invocation for this worker
    pub async fn next_invocation(&self) -> Result<Invocation> {
        let url = format!("{}/{}/runtime/invocation/next", self.base_url, API_VERSION);
        let response = check_status(self.client.get(&url).send().await?).await?;

        let headers = response.headers();
        let request_id = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| {
                ClientError::InvalidResponse(format!("missing {} header", REQUEST_ID_HEADER))
            })?;
        let deadline_ms = headers
            .get(DEADLINE_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<i64>().ok());

        let event = response
            .json::<JsonValue>()
            .await
            .map_err(|e| ClientError::ParseError(format!("Failed to parse event: {}", e)))?;

        Ok(Invocation {
            request_id,
            deadline_ms,
            event,
        })
    }

    /// Reports the result of a completed invocation
    pub async fn post_response(&self, request_id: &str, response: &InvocationResponse) -> Result<()> {
        let url = format!(
            "{}/{}/runtime/invocation/{}/response",
            self.base_url, API_VERSION, request_id
        );
        let response = self.client.post(&url).json(response).send().await?;

        handle_empty_response(response).await
    }

    /// Reports an aborted invocation
    pub async fn post_error(&self, request_id: &str, error: &InvocationError) -> Result<()> {
        let url = format!(
            "{}/{}/runtime/invocation/{}/error",
            self.base_url, API_VERSION, request_id
        );
        let response = self.client.post(&url).json(error).send().await?;

        handle_empty_response(response).await
    }
}
