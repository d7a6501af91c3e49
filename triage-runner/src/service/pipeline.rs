//! Triage pipeline
//!
//! Runs one invocation end to end:
//! `Start → Decoded → KBLoaded → PromptBuilt → ModelInvoked → Decided → ActionResolved → Emitted`.
//!
//! Steps run strictly in order and none is retried. Only the knowledge base
//! load recovers from failure; every other fault aborts the invocation and no
//! [`InvocationResult`] is produced.

use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::{debug, info};
use triage_core::DecodeError;
use triage_core::domain::invocation::InvocationResult;
use triage_core::dto::event::StreamEvent;
use triage_core::prompt::Prompt;

use crate::service::{AnalysisService, KnowledgeLoader, RemediationService};

/// Faults that abort an invocation
#[derive(Debug, Error)]
pub enum TriageError {
    /// The batch could not be decoded
    #[error("failed to decode batch: {0}")]
    Decode(#[from] DecodeError),

    /// The model could not be invoked or its response could not be read
    #[error("model invocation failed: {0:#}")]
    Model(anyhow::Error),

    /// The remediation request (or its ledger claim) failed
    #[error("remediation failed: {0:#}")]
    Remediation(anyhow::Error),
}

impl TriageError {
    /// Error type reported to the runtime
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::Decode(_) => "DecodeError",
            Self::Model(_) => "ModelInvocationError",
            Self::Remediation(_) => "RemediationError",
        }
    }
}

pub struct TriagePipeline {
    knowledge: KnowledgeLoader,
    analysis: AnalysisService,
    remediation: RemediationService,
}

impl TriagePipeline {
    pub fn new(
        knowledge: KnowledgeLoader,
        analysis: AnalysisService,
        remediation: RemediationService,
    ) -> Self {
        Self {
            knowledge,
            analysis,
            remediation,
        }
    }

    /// Runs the pipeline over a raw event document
    pub async fn invoke(&self, event: JsonValue) -> Result<InvocationResult, TriageError> {
        let event = StreamEvent::from_value(event)?;
        self.run(&event).await
    }

    pub async fn run(&self, event: &StreamEvent) -> Result<InvocationResult, TriageError> {
        let batch = event.decode_batch()?;
        let batch_key = event.batch_key();
        debug!("Decoded {} record(s) for batch {}", batch.len(), batch_key);

        let knowledge = self.knowledge.load().await;
        let prompt = Prompt::build(&batch, &knowledge);
        debug!("Built prompt of {} characters", prompt.as_str().len());

        let analysis = self
            .analysis
            .analyze(&prompt)
            .await
            .map_err(TriageError::Model)?;

        let verdict = analysis.verdict();
        info!("Verdict for batch {}: {}", batch_key, verdict);

        let outcome = self
            .remediation
            .execute(verdict, &batch_key)
            .await
            .map_err(TriageError::Remediation)?;
        debug!("Remediation outcome for batch {}: {:?}", batch_key, outcome);

        Ok(InvocationResult::emit(analysis, verdict))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Harness, RecordingCompute, Reply, StaticKnowledge, TARGET_INSTANCE};
    use triage_core::domain::log::LogEntry;

    fn incident_event() -> StreamEvent {
        let entries = [
            LogEntry::new("ERROR: High CPU usage detected"),
            LogEntry::new("WARNING: Disk space running low"),
        ];
        StreamEvent::from_entries(&entries, "partitionKey")
    }

    #[tokio::test]
    async fn test_restart_recommendation_terminates_instance() {
        let harness = Harness::new(
            StaticKnowledge::unavailable(),
            Reply::Chunks(vec![
                r#"{"text":"Severity: high, restart recommended"}"#.to_string(),
            ]),
        );

        let result = harness.pipeline.run(&incident_event()).await.unwrap();

        assert_eq!(
            result,
            InvocationResult {
                status_code: 200,
                analysis: "Severity: high, restart recommended".to_string(),
                action_taken: "action taken".to_string(),
            }
        );
        assert_eq!(harness.compute.terminated(), vec![TARGET_INSTANCE.to_string()]);

        let requests = harness.model.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].prompt.contains(
            "Logs: ERROR: High CPU usage detected WARNING: Disk space running low"
        ));
        assert!(requests[0].prompt.contains("Knowledge Base: {}"));
    }

    #[tokio::test]
    async fn test_healthy_analysis_takes_no_action() {
        let harness = Harness::new(
            StaticKnowledge::unavailable(),
            Reply::Payload("Severity: low, system healthy".to_string()),
        );

        let result = harness.pipeline.run(&incident_event()).await.unwrap();

        assert_eq!(result.status_code, 200);
        assert_eq!(result.analysis, "Severity: low, system healthy");
        assert_eq!(result.action_taken, "no action required");
        assert!(harness.compute.terminated().is_empty());
    }

    #[tokio::test]
    async fn test_knowledge_base_reaches_prompt() {
        let harness = Harness::new(
            StaticKnowledge::serving(r#"{"High CPU usage":"Restart the web tier"}"#),
            Reply::Payload("Severity: medium".to_string()),
        );

        harness.pipeline.run(&incident_event()).await.unwrap();

        let prompt = &harness.model.requests()[0].prompt;
        assert!(prompt.contains(r#"Knowledge Base: {"High CPU usage":"Restart the web tier"}"#));
    }

    #[tokio::test]
    async fn test_redelivered_batch_terminates_at_most_once() {
        let harness = Harness::new(
            StaticKnowledge::unavailable(),
            Reply::Payload("Severity: high, restart recommended".to_string()),
        );

        let first = harness.pipeline.run(&incident_event()).await.unwrap();
        let second = harness.pipeline.run(&incident_event()).await.unwrap();

        assert_eq!(first.action_taken, "action taken");
        assert_eq!(second.action_taken, "action taken");
        assert_eq!(harness.compute.terminated().len(), 1);
        assert_eq!(harness.ledger.len(), 1);
    }

    #[tokio::test]
    async fn test_malformed_record_aborts_before_model() {
        let harness = Harness::new(
            StaticKnowledge::unavailable(),
            Reply::Payload("restart".to_string()),
        );
        let mut event = incident_event();
        event.records[1].kinesis.data = "!!not-base64!!".to_string();

        let err = harness.pipeline.run(&event).await.unwrap_err();

        assert!(matches!(err, TriageError::Decode(DecodeError::Base64 { index: 1, .. })));
        assert_eq!(err.error_type(), "DecodeError");
        assert!(harness.model.requests().is_empty());
        assert!(harness.compute.terminated().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_envelope_is_a_decode_fault() {
        let harness = Harness::new(
            StaticKnowledge::unavailable(),
            Reply::Payload("restart".to_string()),
        );

        let err = harness
            .pipeline
            .invoke(serde_json::json!({ "Records": [{ "kinesis": {} }] }))
            .await
            .unwrap_err();

        assert_eq!(err.error_type(), "DecodeError");
        assert!(harness.model.requests().is_empty());
    }

    #[tokio::test]
    async fn test_invoke_accepts_raw_event_document() {
        let harness = Harness::new(
            StaticKnowledge::unavailable(),
            Reply::Payload("Severity: low".to_string()),
        );
        let document = serde_json::to_value(incident_event()).unwrap();

        let result = harness.pipeline.invoke(document).await.unwrap();

        assert_eq!(result.action_taken, "no action required");
    }

    #[tokio::test]
    async fn test_model_failure_aborts_without_action() {
        let harness = Harness::new(StaticKnowledge::unavailable(), Reply::Unavailable);

        let err = harness.pipeline.run(&incident_event()).await.unwrap_err();

        assert_eq!(err.error_type(), "ModelInvocationError");
        assert!(harness.compute.terminated().is_empty());
    }

    #[tokio::test]
    async fn test_remediation_failure_masks_analysis() {
        let harness = Harness::with_compute(
            StaticKnowledge::unavailable(),
            Reply::Payload("restart recommended".to_string()),
            RecordingCompute::failing(),
        );

        let err = harness.pipeline.run(&incident_event()).await.unwrap_err();

        assert_eq!(err.error_type(), "RemediationError");
        assert!(err.to_string().contains("RequestLimitExceeded"));
        assert_eq!(harness.ledger.len(), 0);
    }
}
