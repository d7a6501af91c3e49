//! Triage Runner
//!
//! A worker that triages batches of application logs with a reasoning model
//! and terminates a compute instance when the model recommends a restart.
//!
//! Architecture:
//! - Configuration: Load settings from the environment, once at startup
//! - Repositories: Object storage, model, compute control plane, remediation ledger
//! - Services: Knowledge loading, analysis, remediation, and the pipeline chaining them
//! - Scheduler: Invocation polling against the hosting runtime
//!
//! Each invocation carries one batch of stream records. The runner decodes it,
//! asks the model for a severity assessment, acts on the verdict and posts the
//! result back to the runtime.

mod config;
mod db;
mod repository;
mod scheduler;
mod service;
#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::repository::{
    HttpComputeRepository, HttpKnowledgeRepository, HttpModelRepository, InMemoryLedger,
    LedgerRepository, PgLedger,
};
use crate::scheduler::InvocationPoller;
use crate::service::{AnalysisService, KnowledgeLoader, RemediationService, TriagePipeline};
use triage_client::{ComputeClient, ModelClient, RuntimeClient, StorageClient};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "triage_runner=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Triage Runner");

    let config = load_config()?;
    info!(
        "Loaded configuration: model_id={}, knowledge_base={}/{}, instance_id={}",
        config.model_id, config.knowledge_base_bucket, config.knowledge_base_key, config.instance_id
    );

    let ledger = build_ledger(&config).await?;
    let pipeline = Arc::new(build_pipeline(&config, ledger));
    let runtime = Arc::new(RuntimeClient::new(config.runtime_api_url.clone()));

    info!("Runner initialized successfully");
    info!(
        "Model streaming: {}, invocation timeout: {:?}",
        config.model_streaming, config.invocation_timeout
    );

    let poller = InvocationPoller::new(config, runtime, pipeline);
    if let Err(e) = poller.run().await {
        error!("Poller error: {:#}", e);
        return Err(e);
    }

    Ok(())
}

/// Loads and validates configuration from environment variables
fn load_config() -> Result<Config> {
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate()?;
    Ok(config)
}

/// Picks the remediation ledger backend
///
/// Without a database the ledger only covers redeliveries to this process.
async fn build_ledger(config: &Config) -> Result<Arc<dyn LedgerRepository>> {
    match &config.database_url {
        Some(url) => {
            info!("Connecting to remediation ledger database");
            let pool = db::create_pool(url)
                .await
                .context("Failed to connect to database")?;
            db::run_migrations(&pool)
                .await
                .context("Failed to run migrations")?;
            Ok(Arc::new(PgLedger::new(pool)))
        }
        None => {
            warn!("DATABASE_URL not set, using in-memory remediation ledger");
            Ok(Arc::new(InMemoryLedger::new()))
        }
    }
}

fn build_pipeline(config: &Config, ledger: Arc<dyn LedgerRepository>) -> TriagePipeline {
    let knowledge = KnowledgeLoader::new(
        Arc::new(HttpKnowledgeRepository::new(StorageClient::new(
            config.storage_endpoint.clone(),
        ))),
        config.knowledge_base_bucket.clone(),
        config.knowledge_base_key.clone(),
    );

    let analysis = AnalysisService::new(
        Arc::new(HttpModelRepository::new(
            ModelClient::new(config.model_endpoint.clone()),
            config.model_streaming,
        )),
        config.model_id.clone(),
        config.inference,
    );

    let remediation = RemediationService::new(
        Arc::new(HttpComputeRepository::new(ComputeClient::new(
            config.compute_endpoint.clone(),
        ))),
        ledger,
        config.instance_id.clone(),
    );

    TriagePipeline::new(knowledge, analysis, remediation)
}
