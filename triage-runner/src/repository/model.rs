//! Model repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use triage_client::{ModelClient, ModelResponse};
use triage_core::dto::model::InferenceRequest;

/// Repository trait for invoking the reasoning model
#[async_trait]
pub trait ModelRepository: Send + Sync {
    /// Submits a request and returns the response channel
    ///
    /// Errors returned here mean the model could not be invoked at all.
    /// Errors while consuming a streamed response arrive through the stream.
    async fn invoke(&self, model_id: &str, request: &InferenceRequest) -> Result<ModelResponse>;
}

/// HTTP implementation of ModelRepository
pub struct HttpModelRepository {
    client: ModelClient,
    streaming: bool,
}

impl HttpModelRepository {
    /// # Arguments
    /// * `client` - Model service client
    /// * `streaming` - Whether to use the streamed endpoint
    pub fn new(client: ModelClient, streaming: bool) -> Self {
        Self { client, streaming }
    }
}

#[async_trait]
impl ModelRepository for HttpModelRepository {
    async fn invoke(&self, model_id: &str, request: &InferenceRequest) -> Result<ModelResponse> {
        let response = if self.streaming {
            self.client.invoke_stream(model_id, request).await
        } else {
            self.client.invoke(model_id, request).await
        };

        response.with_context(|| format!("Failed to invoke model {}", model_id))
    }
}
