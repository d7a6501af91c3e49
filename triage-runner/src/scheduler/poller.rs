//! Invocation poller
//!
//! Pulls invocations from the hosting runtime and runs each through the
//! pipeline. Every invocation gets exactly one answer: the result document,
//! or an error document when the pipeline aborts or runs out of time.

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::{self, Duration};
use tracing::{debug, error, info, warn};
use triage_client::RuntimeClient;
use triage_core::dto::invocation::{InvocationError, InvocationResponse};

use crate::config::Config;
use crate::service::TriagePipeline;

const INITIAL_DELAY_MS: u64 = 500;
const MAX_DELAY_MS: u64 = 30_000;

/// Error type reported when an invocation overruns its budget
const TIMEOUT_ERROR_TYPE: &str = "Timeout";

#[derive(Clone)]
pub struct InvocationPoller {
    config: Config,
    runtime: Arc<RuntimeClient>,
    pipeline: Arc<TriagePipeline>,
}

impl InvocationPoller {
    pub fn new(config: Config, runtime: Arc<RuntimeClient>, pipeline: Arc<TriagePipeline>) -> Self {
        Self {
            config,
            runtime,
            pipeline,
        }
    }

    /// Starts `max_concurrency` workers and waits on them
    pub async fn run(&self) -> Result<()> {
        info!(
            "Starting {} invocation worker(s) against {}",
            self.config.max_concurrency,
            self.runtime.base_url()
        );

        let mut workers = JoinSet::new();
        for worker in 0..self.config.max_concurrency {
            let poller = self.clone();
            workers.spawn(async move { poller.work(worker).await });
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                error!("Invocation worker panicked: {}", e);
            }
        }

        anyhow::bail!("All invocation workers stopped")
    }

    async fn work(&self, worker: usize) {
        let mut delay_ms = INITIAL_DELAY_MS;

        loop {
            match self.poll_once().await {
                Ok(()) => delay_ms = INITIAL_DELAY_MS,
                Err(e) => {
                    warn!("Worker {}: {:#}", worker, e);
                    warn!("Worker {} retrying in {} ms...", worker, delay_ms);

                    time::sleep(Duration::from_millis(delay_ms)).await;

                    // Exponential backoff with cap
                    delay_ms = (delay_ms * 2).min(MAX_DELAY_MS);
                }
            }
        }
    }

    /// Handles one invocation
    ///
    /// Pipeline faults are answered with an error document and count as
    /// success here; only failures to talk to the runtime are returned.
    pub async fn poll_once(&self) -> Result<()> {
        let invocation = self
            .runtime
            .next_invocation()
            .await
            .context("Failed to fetch next invocation")?;
        let request_id = invocation.request_id;

        let budget = time_budget(
            invocation.deadline_ms,
            self.config.invocation_timeout,
            chrono::Utc::now().timestamp_millis(),
        );
        debug!("Invocation {} has {:?} to complete", request_id, budget);

        match time::timeout(budget, self.pipeline.invoke(invocation.event)).await {
            Ok(Ok(result)) => {
                info!(
                    "Invocation {} completed: {}",
                    request_id, result.action_taken
                );
                self.runtime
                    .post_response(&request_id, &InvocationResponse::from(&result))
                    .await
                    .context("Failed to post invocation response")?;
            }
            Ok(Err(e)) => {
                error!("Invocation {} failed: {}", request_id, e);
                self.runtime
                    .post_error(&request_id, &InvocationError::new(e.error_type(), e.to_string()))
                    .await
                    .context("Failed to post invocation error")?;
            }
            Err(_) => {
                error!("Invocation {} timed out after {:?}", request_id, budget);
                let message = format!("Invocation exceeded its {:?} budget", budget);
                self.runtime
                    .post_error(&request_id, &InvocationError::new(TIMEOUT_ERROR_TYPE, message))
                    .await
                    .context("Failed to post invocation timeout")?;
            }
        }

        Ok(())
    }
}

/// Time left for an invocation
///
/// The runtime deadline wins when present; an already passed deadline leaves
/// no time at all.
pub fn time_budget(deadline_ms: Option<i64>, fallback: Duration, now_ms: i64) -> Duration {
    match deadline_ms {
        Some(deadline) => Duration::from_millis(deadline.saturating_sub(now_ms).max(0) as u64),
        None => fallback,
    }
}
