//! Knowledge document repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use triage_client::StorageClient;

/// Repository trait for fetching the knowledge base document
#[async_trait]
pub trait KnowledgeRepository: Send + Sync {
    /// Fetches the raw document bytes
    ///
    /// # Arguments
    /// * `container` - Storage container name
    /// * `key` - Object key of the document
    async fn fetch_document(&self, container: &str, key: &str) -> Result<Vec<u8>>;
}

/// Object storage implementation of KnowledgeRepository
pub struct HttpKnowledgeRepository {
    client: StorageClient,
}

impl HttpKnowledgeRepository {
    pub fn new(client: StorageClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl KnowledgeRepository for HttpKnowledgeRepository {
    async fn fetch_document(&self, container: &str, key: &str) -> Result<Vec<u8>> {
        let body = self
            .client
            .get_object(container, key)
            .await
            .with_context(|| format!("Failed to fetch {}/{}", container, key))?;

        Ok(body.to_vec())
    }
}
