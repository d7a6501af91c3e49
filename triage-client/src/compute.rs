//! Compute control plane client

use reqwest::Client;
use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::{handle_empty_response, normalize_base_url};

/// HTTP client for instance lifecycle requests
#[derive(Debug, Clone)]
pub struct ComputeClient {
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct TerminateInstancesRequest<'a> {
    #[serde(rename = "InstanceIds")]
    instance_ids: &'a [String],
}

impl ComputeClient {
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

    /// Requests termination of the given instances
    ///
    /// Returns once the control plane accepts the request; the instances'
    /// final state is not observed.
    pub async fn terminate_instances(&self, instance_ids: &[String]) -> Result<()> {
        let url = format!("{}/instances/terminate", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&TerminateInstancesRequest { instance_ids })
            .send()
            .await?;

        handle_empty_response(response).await?;
        debug!("Terminate accepted for {:?}", instance_ids);
        Ok(())
    }
}
