//! Repository layer
//!
//! Repositories are thin adapters over external capabilities: object storage,
//! the model service, the compute control plane and the remediation ledger.
//! They carry no business logic.
//!
//! All repositories are trait-based so services can be exercised with fakes.

mod compute;
mod knowledge;
mod ledger;
mod model;

// Re-export traits
pub use compute::ComputeRepository;
pub use knowledge::KnowledgeRepository;
pub use ledger::LedgerRepository;
pub use model::ModelRepository;

// Re-export implementations
pub use compute::HttpComputeRepository;
pub use knowledge::HttpKnowledgeRepository;
pub use ledger::{InMemoryLedger, PgLedger};
pub use model::HttpModelRepository;
