//! Compute repository

use anyhow::{Context, Result};
use async_trait::async_trait;
use triage_client::ComputeClient;

/// Repository trait for destructive lifecycle actions on compute resources
#[async_trait]
pub trait ComputeRepository: Send + Sync {
    /// Requests termination of one instance
    async fn terminate_instance(&self, instance_id: &str) -> Result<()>;
}

/// HTTP implementation of ComputeRepository
pub struct HttpComputeRepository {
    client: ComputeClient,
}

impl HttpComputeRepository {
    pub fn new(client: ComputeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ComputeRepository for HttpComputeRepository {
    async fn terminate_instance(&self, instance_id: &str) -> Result<()> {
        self.client
            .terminate_instances(&[instance_id.to_string()])
            .await
            .with_context(|| format!("Failed to terminate instance {}", instance_id))
    }
}
