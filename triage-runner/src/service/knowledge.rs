//! Knowledge base loader
//!
//! Fetches the reference document for every invocation. Never fails: when the
//! document cannot be fetched or parsed the pipeline continues with an empty
//! knowledge base and the problem is only visible in the logs.

use std::sync::Arc;
use tracing::{debug, warn};
use triage_core::domain::knowledge::KnowledgeBase;

use crate::repository::KnowledgeRepository;

pub struct KnowledgeLoader {
    repository: Arc<dyn KnowledgeRepository>,
    container: String,
    key: String,
}

impl KnowledgeLoader {
    pub fn new(
        repository: Arc<dyn KnowledgeRepository>,
        container: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            repository,
            container: container.into(),
            key: key.into(),
        }
    }

    pub async fn load(&self) -> KnowledgeBase {
        let document = match self
            .repository
            .fetch_document(&self.container, &self.key)
            .await
        {
            Ok(document) => document,
            Err(e) => {
                warn!("Error retrieving knowledge base: {:#}", e);
                return KnowledgeBase::empty();
            }
        };

        match KnowledgeBase::from_slice(&document) {
            Ok(knowledge) => {
                debug!("Loaded knowledge base with {} entries", knowledge.len());
                knowledge
            }
            Err(e) => {
                warn!(
                    "Knowledge base {}/{} is not a JSON object: {}",
                    self.container, self.key, e
                );
                KnowledgeBase::empty()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::StaticKnowledge;

    fn loader(knowledge: StaticKnowledge) -> KnowledgeLoader {
        KnowledgeLoader::new(Arc::new(knowledge), "kb-bucket", "knowledge_base.json")
    }

    #[tokio::test]
    async fn test_fetch_failure_yields_empty_knowledge() {
        let knowledge = loader(StaticKnowledge::unavailable()).load().await;
        assert!(knowledge.is_empty());
    }

    #[tokio::test]
    async fn test_unparsable_document_yields_empty_knowledge() {
        for document in ["{ truncated", "[\"not\", \"a map\"]", ""] {
            let knowledge = loader(StaticKnowledge::serving(document)).load().await;
            assert!(knowledge.is_empty(), "document {document:?} should be ignored");
        }
    }

    #[tokio::test]
    async fn test_loads_document() {
        let knowledge = loader(StaticKnowledge::serving(
            r#"{"High CPU usage": "Restart the service", "Disk space": "Clean /var/log"}"#,
        ))
        .load()
        .await;

        assert_eq!(knowledge.len(), 2);
        assert_eq!(
            knowledge.get("Disk space").and_then(|v| v.as_str()),
            Some("Clean /var/log")
        );
    }
}
