//! Test doubles for the repository traits

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::sync::{Arc, Mutex};
use triage_client::{ClientError, ModelResponse};
use triage_core::dto::model::InferenceRequest;

use crate::repository::{ComputeRepository, InMemoryLedger, KnowledgeRepository, ModelRepository};
use crate::service::{AnalysisService, KnowledgeLoader, RemediationService, TriagePipeline};
use triage_core::dto::model::InferenceParameters;

pub const TARGET_INSTANCE: &str = "i-0123456789abcdef0";

/// Knowledge store that either serves a fixed document or is unreachable
pub struct StaticKnowledge {
    document: Option<Vec<u8>>,
}

impl StaticKnowledge {
    pub fn serving(document: &str) -> Self {
        Self {
            document: Some(document.as_bytes().to_vec()),
        }
    }

    pub fn unavailable() -> Self {
        Self { document: None }
    }
}

#[async_trait]
impl KnowledgeRepository for StaticKnowledge {
    async fn fetch_document(&self, container: &str, key: &str) -> Result<Vec<u8>> {
        self.document
            .clone()
            .ok_or_else(|| anyhow::anyhow!("{}/{}: access denied", container, key))
    }
}

/// What the fake model answers with
#[derive(Clone)]
pub enum Reply {
    Payload(String),
    Chunks(Vec<String>),
    ChunksThenError(Vec<String>, String),
    Unavailable,
    /// Never answers
    Stalled,
}

/// Model that replays a scripted reply and records every request
pub struct ScriptedModel {
    reply: Reply,
    requests: Mutex<Vec<InferenceRequest>>,
}

impl ScriptedModel {
    pub fn new(reply: Reply) -> Self {
        Self {
            reply,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<InferenceRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn chunk_items(chunks: &[String]) -> Vec<triage_client::Result<Bytes>> {
    chunks
        .iter()
        .map(|chunk| Ok(Bytes::from(chunk.clone())))
        .collect()
}

#[async_trait]
impl ModelRepository for ScriptedModel {
    async fn invoke(&self, _model_id: &str, request: &InferenceRequest) -> Result<ModelResponse> {
        self.requests.lock().unwrap().push(request.clone());

        match &self.reply {
            Reply::Payload(text) => Ok(ModelResponse::Payload(Bytes::from(text.clone()))),
            Reply::Chunks(chunks) => Ok(ModelResponse::Stream(
                stream::iter(chunk_items(chunks)).boxed(),
            )),
            Reply::ChunksThenError(chunks, message) => {
                let mut items = chunk_items(chunks);
                items.push(Err(ClientError::Stream(message.clone())));
                Ok(ModelResponse::Stream(stream::iter(items).boxed()))
            }
            Reply::Unavailable => anyhow::bail!("model endpoint unreachable"),
            Reply::Stalled => futures::future::pending().await,
        }
    }
}

/// Compute control plane that records terminate calls
#[derive(Default)]
pub struct RecordingCompute {
    terminated: Mutex<Vec<String>>,
    failing: bool,
    stalled: bool,
}

impl RecordingCompute {
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Records the call, then never answers
    pub fn stalled() -> Self {
        Self {
            stalled: true,
            ..Self::default()
        }
    }

    pub fn terminated(&self) -> Vec<String> {
        self.terminated.lock().unwrap().clone()
    }
}

#[async_trait]
impl ComputeRepository for RecordingCompute {
    async fn terminate_instance(&self, instance_id: &str) -> Result<()> {
        self.terminated.lock().unwrap().push(instance_id.to_string());
        if self.stalled {
            futures::future::pending::<()>().await;
        }
        if self.failing {
            anyhow::bail!("RequestLimitExceeded");
        }
        Ok(())
    }
}

/// A pipeline wired to fakes, with handles kept for assertions
pub struct Harness {
    pub pipeline: Arc<TriagePipeline>,
    pub model: Arc<ScriptedModel>,
    pub compute: Arc<RecordingCompute>,
    pub ledger: InMemoryLedger,
}

impl Harness {
    pub fn new(knowledge: StaticKnowledge, reply: Reply) -> Self {
        Self::with_compute(knowledge, reply, RecordingCompute::default())
    }

    pub fn with_compute(knowledge: StaticKnowledge, reply: Reply, compute: RecordingCompute) -> Self {
        let model = Arc::new(ScriptedModel::new(reply));
        let compute = Arc::new(compute);
        let ledger = InMemoryLedger::new();

        let pipeline = Arc::new(TriagePipeline::new(
            KnowledgeLoader::new(Arc::new(knowledge), "kb-bucket", "knowledge_base.json"),
            AnalysisService::new(model.clone(), "test-model", InferenceParameters::default()),
            RemediationService::new(compute.clone(), Arc::new(ledger.clone()), TARGET_INSTANCE),
        ));

        Self {
            pipeline,
            model,
            compute,
            ledger,
        }
    }
}
