//! Triage HTTP Clients
//!
//! Typed async clients for every external capability the triage runner talks to:
//!
//! - [`RuntimeClient`]: the hosting runtime API (next invocation, response, error)
//! - [`StorageClient`]: object storage holding the knowledge base document
//! - [`ModelClient`]: the reasoning model, single-shot or streamed
//! - [`ComputeClient`]: the compute control plane used for remediation
//!
//! # Example
//!
//! ```no_run
//! use triage_client::StorageClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let storage = StorageClient::new("http://localhost:9002");
//!     let document = storage.get_object("knowledge", "knowledge_base.json").await?;
//!     println!("fetched {} bytes", document.len());
//!     Ok(())
//! }
//! ```

mod compute;
pub mod error;
mod model;
mod runtime;
mod storage;

// Re-export commonly used types
pub use compute::ComputeClient;
pub use error::{ClientError, Result};
pub use model::{ChunkStream, ModelClient, ModelResponse};
pub use runtime::{DEADLINE_HEADER, Invocation, REQUEST_ID_HEADER, RuntimeClient};
pub use storage::StorageClient;

/// Strips trailing slashes so paths can be appended with `format!`
fn normalize_base_url(base_url: impl Into<String>) -> String {
    base_url.into().trim_end_matches('/').to_string()
}

// =============================================================================
// Response Handlers
// =============================================================================

/// Turns a non-success status into [`ClientError::ApiError`]
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::api_error(status.as_u16(), error_text));
    }

    Ok(response)
}

/// Checks the status of a response whose body is ignored
async fn handle_empty_response(response: reqwest::Response) -> Result<()> {
    check_status(response).await.map(|_| ())
}
