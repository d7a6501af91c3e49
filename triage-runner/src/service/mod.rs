//! Service layer
//!
//! Services hold the triage business logic. Each one owns the repositories
//! it needs, injected at construction, and the pipeline chains them in order:
//! decode, load knowledge, build prompt, analyze, decide, remediate, emit.

mod analysis;
mod knowledge;
mod pipeline;
mod remediation;

pub use analysis::AnalysisService;
pub use knowledge::KnowledgeLoader;
pub use pipeline::{TriageError, TriagePipeline};
pub use remediation::{ActionOutcome, RemediationService};
