//! Remediation service
//!
//! Acts on the verdict. A remediation terminates the configured instance with a
//! single fire-and-forget request: no polling, no retry, no check of the final
//! state. The ledger makes the request at-most-once per (batch, instance), so a
//! redelivered batch does not terminate the same instance again. A claim is
//! only kept once the terminate request has been accepted.

use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use triage_core::domain::analysis::RemediationVerdict;
use triage_core::dto::event::BatchKey;

use crate::repository::{ComputeRepository, LedgerRepository};

/// What the executor did for one invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Verdict was NoAction; nothing was called
    NotRequired,
    /// Terminate request accepted
    Terminated,
    /// This batch already remediated the instance
    AlreadyActioned,
}

pub struct RemediationService {
    compute: Arc<dyn ComputeRepository>,
    ledger: Arc<dyn LedgerRepository>,
    instance_id: String,
}

impl RemediationService {
    /// # Arguments
    /// * `compute` - Control plane used for the terminate request
    /// * `ledger` - At-most-once guard
    /// * `instance_id` - Target instance, from configuration (never from the analysis)
    pub fn new(
        compute: Arc<dyn ComputeRepository>,
        ledger: Arc<dyn LedgerRepository>,
        instance_id: impl Into<String>,
    ) -> Self {
        Self {
            compute,
            ledger,
            instance_id: instance_id.into(),
        }
    }

    pub async fn execute(
        &self,
        verdict: RemediationVerdict,
        batch_key: &BatchKey,
    ) -> Result<ActionOutcome> {
        if !verdict.requires_action() {
            debug!("No remediation required for batch {}", batch_key);
            return Ok(ActionOutcome::NotRequired);
        }

        if !self.ledger.claim(batch_key, &self.instance_id).await? {
            warn!(
                "Batch {} already remediated instance {}, skipping terminate",
                batch_key, self.instance_id
            );
            return Ok(ActionOutcome::AlreadyActioned);
        }

        let claim = ClaimGuard::new(self.ledger.clone(), batch_key, &self.instance_id);

        if let Err(e) = self.compute.terminate_instance(&self.instance_id).await {
            claim.release().await;
            return Err(e);
        }
        claim.keep();

        info!(
            "Instance {} terminated due to detected issue",
            self.instance_id
        );
        Ok(ActionOutcome::Terminated)
    }
}

/// Held between a successful claim and the end of the terminate request
///
/// Dropped without `keep` or `release` (the invocation was cancelled while the
/// request was in flight), it releases the claim in the background so a
/// redelivery can act again.
struct ClaimGuard {
    ledger: Arc<dyn LedgerRepository>,
    batch_key: BatchKey,
    resource_id: String,
    armed: bool,
}

impl ClaimGuard {
    fn new(ledger: Arc<dyn LedgerRepository>, batch_key: &BatchKey, resource_id: &str) -> Self {
        Self {
            ledger,
            batch_key: batch_key.clone(),
            resource_id: resource_id.to_string(),
            armed: true,
        }
    }

    /// Terminate accepted; the claim stays
    fn keep(mut self) {
        self.armed = false;
    }

    async fn release(mut self) {
        self.armed = false;
        release_claim(&*self.ledger, &self.batch_key, &self.resource_id).await;
    }
}

impl Drop for ClaimGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        warn!(
            "Terminate of {} abandoned for batch {}, releasing claim",
            self.resource_id, self.batch_key
        );
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            error!(
                "No runtime to release remediation claim for batch {}",
                self.batch_key
            );
            return;
        };

        let ledger = self.ledger.clone();
        let batch_key = self.batch_key.clone();
        let resource_id = std::mem::take(&mut self.resource_id);
        runtime.spawn(async move {
            release_claim(&*ledger, &batch_key, &resource_id).await;
        });
    }
}

async fn release_claim(ledger: &dyn LedgerRepository, batch_key: &BatchKey, resource_id: &str) {
    if let Err(e) = ledger.release(batch_key, resource_id).await {
        error!(
            "Failed to release remediation claim for batch {}: {:#}",
            batch_key, e
        );
    }
}
