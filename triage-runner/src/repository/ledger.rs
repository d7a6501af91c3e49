//! Remediation ledger
//!
//! Records which (batch, resource) pairs have already been remediated so a
//! redelivered batch does not terminate the same resource twice.

use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use triage_core::dto::event::BatchKey;

/// Repository trait for the at-most-once remediation guard
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Claims the pair; returns `false` if it was already claimed
    async fn claim(&self, batch_key: &BatchKey, resource_id: &str) -> Result<bool>;

    /// Drops a claim so a later delivery may act again
    async fn release(&self, batch_key: &BatchKey, resource_id: &str) -> Result<()>;
}

/// Process-local ledger; claims are lost on restart
///
/// The claim set is never pruned. It grows by one entry per terminate
/// accepted, which stays small for the life of a worker.
#[derive(Clone, Default)]
pub struct InMemoryLedger {
    claims: Arc<Mutex<HashSet<(String, String)>>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.claims.lock().unwrap().len()
    }
}

#[async_trait]
impl LedgerRepository for InMemoryLedger {
    async fn claim(&self, batch_key: &BatchKey, resource_id: &str) -> Result<bool> {
        let mut claims = self
            .claims
            .lock()
            .map_err(|_| anyhow::anyhow!("ledger lock poisoned"))?;
        Ok(claims.insert((batch_key.to_string(), resource_id.to_string())))
    }

    async fn release(&self, batch_key: &BatchKey, resource_id: &str) -> Result<()> {
        let mut claims = self
            .claims
            .lock()
            .map_err(|_| anyhow::anyhow!("ledger lock poisoned"))?;
        claims.remove(&(batch_key.to_string(), resource_id.to_string()));
        Ok(())
    }
}

/// Postgres-backed ledger shared by every runner process
pub struct PgLedger {
    pool: PgPool,
}

impl PgLedger {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LedgerRepository for PgLedger {
    async fn claim(&self, batch_key: &BatchKey, resource_id: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO remediation_ledger (batch_key, resource_id, claimed_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (batch_key, resource_id) DO NOTHING
            "#,
        )
        .bind(batch_key.as_str())
        .bind(resource_id)
        .bind(chrono::Utc::now())
        .execute(&self.pool)
        .await
        .context("Failed to claim remediation")?;

        Ok(result.rows_affected() == 1)
    }

    async fn release(&self, batch_key: &BatchKey, resource_id: &str) -> Result<()> {
        sqlx::query("DELETE FROM remediation_ledger WHERE batch_key = $1 AND resource_id = $2")
            .bind(batch_key.as_str())
            .bind(resource_id)
            .execute(&self.pool)
            .await
            .context("Failed to release remediation claim")?;

        Ok(())
    }
}
