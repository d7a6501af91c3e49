//! Analysis service
//!
//! Submits the prompt to the model and assembles the response. Whether the
//! model answers in one payload or in chunks, the result is the concatenation
//! of every chunk's text in arrival order. The stream is consumed to the end
//! before anything downstream runs.

use anyhow::{Context, Result};
use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, info};
use triage_core::domain::analysis::AnalysisResult;
use triage_core::dto::model::{InferenceParameters, InferenceRequest, chunk_text};
use triage_core::prompt::Prompt;

use crate::repository::ModelRepository;

pub struct AnalysisService {
    repository: Arc<dyn ModelRepository>,
    model_id: String,
    parameters: InferenceParameters,
}

impl AnalysisService {
    pub fn new(
        repository: Arc<dyn ModelRepository>,
        model_id: impl Into<String>,
        parameters: InferenceParameters,
    ) -> Self {
        Self {
            repository,
            model_id: model_id.into(),
            parameters,
        }
    }

    /// Invokes the model and concatenates the decoded chunks
    ///
    /// Any failure, including one in the middle of a stream, discards the
    /// partial text.
    pub async fn analyze(&self, prompt: &Prompt) -> Result<AnalysisResult> {
        let request = InferenceRequest::new(prompt, self.parameters);
        let response = self.repository.invoke(&self.model_id, &request).await?;

        let mut chunks = response.into_chunks();
        let mut analysis = AnalysisResult::default();
        let mut received = 0usize;

        while let Some(chunk) = chunks.next().await {
            let payload =
                chunk.with_context(|| format!("Model stream failed after {} chunk(s)", received))?;
            let fragment = chunk_text(&payload)
                .with_context(|| format!("Failed to decode response chunk {}", received))?;

            debug!("Chunk {}: {} characters", received, fragment.len());
            analysis.push_fragment(&fragment);
            received += 1;
        }

        info!(
            "Model {} returned {} chunk(s), {} characters of analysis",
            self.model_id,
            received,
            analysis.as_str().len()
        );

        Ok(analysis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Reply, ScriptedModel};

    fn service(model: Arc<ScriptedModel>) -> AnalysisService {
        AnalysisService::new(model, "test-model", InferenceParameters::default())
    }

    fn chunks(texts: &[&str]) -> Vec<String> {
        texts
            .iter()
            .map(|text| serde_json::json!({ "text": text }).to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_chunks_concatenate_in_order() {
        let model = Arc::new(ScriptedModel::new(Reply::Chunks(chunks(&["a", "b", "c"]))));

        let analysis = service(model)
            .analyze(&Prompt::from_text("p"))
            .await
            .unwrap();

        assert_eq!(analysis.as_str(), "abc");
    }

    #[tokio::test]
    async fn test_metadata_chunks_add_nothing() {
        let mut replies = chunks(&["Severity: low"]);
        replies.push(r#"{"amazon-bedrock-invocationMetrics":{"outputTokenCount":4}}"#.to_string());
        let model = Arc::new(ScriptedModel::new(Reply::Chunks(replies)));

        let analysis = service(model)
            .analyze(&Prompt::from_text("p"))
            .await
            .unwrap();

        assert_eq!(analysis.as_str(), "Severity: low");
    }

    #[tokio::test]
    async fn test_single_payload_is_one_chunk() {
        let model = Arc::new(ScriptedModel::new(Reply::Payload(
            "Severity: low, system healthy".to_string(),
        )));

        let analysis = service(model)
            .analyze(&Prompt::from_text("p"))
            .await
            .unwrap();

        assert_eq!(analysis.as_str(), "Severity: low, system healthy");
    }

    #[tokio::test]
    async fn test_empty_stream_gives_empty_analysis() {
        let model = Arc::new(ScriptedModel::new(Reply::Chunks(Vec::new())));

        let analysis = service(model)
            .analyze(&Prompt::from_text("p"))
            .await
            .unwrap();

        assert_eq!(analysis.as_str(), "");
    }

    #[tokio::test]
    async fn test_stream_error_discards_partial_text() {
        let model = Arc::new(ScriptedModel::new(Reply::ChunksThenError(
            chunks(&["restart"]),
            "connection reset".to_string(),
        )));

        let err = service(model)
            .analyze(&Prompt::from_text("p"))
            .await
            .unwrap_err();

        assert!(format!("{:#}", err).contains("connection reset"));
    }

    #[tokio::test]
    async fn test_invoke_failure_propagates() {
        let model = Arc::new(ScriptedModel::new(Reply::Unavailable));
        assert!(service(model).analyze(&Prompt::from_text("p")).await.is_err());
    }

    #[tokio::test]
    async fn test_request_carries_prompt_and_parameters() {
        let model = Arc::new(ScriptedModel::new(Reply::Payload("ok".to_string())));
        let service = AnalysisService::new(
            model.clone(),
            "test-model",
            InferenceParameters {
                max_tokens: 42,
                temperature: 0.1,
            },
        );

        service.analyze(&Prompt::from_text("the prompt")).await.unwrap();

        let requests = model.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].prompt, "the prompt");
        assert_eq!(requests[0].max_tokens_to_sample, 42);
    }
}
