//! Runner configuration
//!
//! Defines the endpoints of every external capability, the pipeline's fixed
//! parameters (model, knowledge base location, remediation target) and the
//! invocation limits.

use std::time::Duration;

use triage_core::dto::model::InferenceParameters;

/// Runner configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Hosting runtime API base URL
    pub runtime_api_url: String,

    /// Reasoning model identifier
    pub model_id: String,

    /// Storage container holding the knowledge base
    pub knowledge_base_bucket: String,

    /// Object key of the knowledge base document
    pub knowledge_base_key: String,

    /// Compute resource terminated on a remediation verdict
    pub instance_id: String,

    pub model_endpoint: String,
    pub storage_endpoint: String,
    pub compute_endpoint: String,

    /// Use the streamed model endpoint instead of the single-shot one
    pub model_streaming: bool,

    /// Fixed sampling parameters
    pub inference: InferenceParameters,

    /// Upper bound on one invocation when the runtime sends no deadline
    pub invocation_timeout: Duration,

    /// Number of invocations handled concurrently
    pub max_concurrency: usize,

    /// Postgres URL for the remediation ledger; in-memory ledger when unset
    pub database_url: Option<String>,
}

impl Config {
    /// Creates a new configuration with defaults
    pub fn new(
        runtime_api_url: String,
        model_id: String,
        knowledge_base_bucket: String,
        instance_id: String,
    ) -> Self {
        Self {
            runtime_api_url,
            model_id,
            knowledge_base_bucket,
            knowledge_base_key: "knowledge_base.json".to_string(),
            instance_id,
            model_endpoint: "http://localhost:9001".to_string(),
            storage_endpoint: "http://localhost:9002".to_string(),
            compute_endpoint: "http://localhost:9003".to_string(),
            model_streaming: true,
            inference: InferenceParameters::default(),
            invocation_timeout: Duration::from_secs(120),
            max_concurrency: 1,
            database_url: None,
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - RUNTIME_API_URL (required)
    /// - MODEL_ID (required)
    /// - KNOWLEDGE_BASE_BUCKET (required)
    /// - INSTANCE_ID (required)
    /// - KNOWLEDGE_BASE_KEY (optional, default: knowledge_base.json)
    /// - MODEL_ENDPOINT / STORAGE_ENDPOINT / COMPUTE_ENDPOINT (optional)
    /// - MODEL_STREAMING (optional, default: true)
    /// - MAX_TOKENS (optional, default: 100)
    /// - TEMPERATURE (optional, default: 0.7)
    /// - INVOCATION_TIMEOUT (optional, seconds, default: 120)
    /// - MAX_CONCURRENCY (optional, default: 1)
    /// - DATABASE_URL (optional)
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from any key/value source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| anyhow::anyhow!("{} environment variable not set", key))
        };

        let mut config = Self::new(
            required("RUNTIME_API_URL")?,
            required("MODEL_ID")?,
            required("KNOWLEDGE_BASE_BUCKET")?,
            required("INSTANCE_ID")?,
        );

        if let Some(key) = lookup("KNOWLEDGE_BASE_KEY") {
            config.knowledge_base_key = key;
        }
        if let Some(url) = lookup("MODEL_ENDPOINT") {
            config.model_endpoint = url;
        }
        if let Some(url) = lookup("STORAGE_ENDPOINT") {
            config.storage_endpoint = url;
        }
        if let Some(url) = lookup("COMPUTE_ENDPOINT") {
            config.compute_endpoint = url;
        }

        config.model_streaming = lookup("MODEL_STREAMING")
            .and_then(|s| s.parse::<bool>().ok())
            .unwrap_or(config.model_streaming);

        config.inference.max_tokens = lookup("MAX_TOKENS")
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(config.inference.max_tokens);

        config.inference.temperature = lookup("TEMPERATURE")
            .and_then(|s| s.parse::<f32>().ok())
            .unwrap_or(config.inference.temperature);

        config.invocation_timeout = lookup("INVOCATION_TIMEOUT")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(config.invocation_timeout);

        config.max_concurrency = lookup("MAX_CONCURRENCY")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(config.max_concurrency);

        config.database_url = lookup("DATABASE_URL").filter(|url| !url.is_empty());

        Ok(config)
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in [
            ("model_id", &self.model_id),
            ("knowledge_base_bucket", &self.knowledge_base_bucket),
            ("knowledge_base_key", &self.knowledge_base_key),
            ("instance_id", &self.instance_id),
        ] {
            if value.is_empty() {
                anyhow::bail!("{} cannot be empty", name);
            }
        }

        for (name, url) in [
            ("runtime_api_url", &self.runtime_api_url),
            ("model_endpoint", &self.model_endpoint),
            ("storage_endpoint", &self.storage_endpoint),
            ("compute_endpoint", &self.compute_endpoint),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                anyhow::bail!("{} must start with http:// or https://", name);
            }
        }

        if self.invocation_timeout.is_zero() {
            anyhow::bail!("invocation_timeout must be greater than 0");
        }

        if self.max_concurrency == 0 {
            anyhow::bail!("max_concurrency must be greater than 0");
        }

        if self.inference.max_tokens == 0 {
            anyhow::bail!("max_tokens must be greater than 0");
        }

        if !(0.0..=1.0).contains(&self.inference.temperature) {
            anyhow::bail!("temperature must be between 0 and 1");
        }

        Ok(())
    }
}
