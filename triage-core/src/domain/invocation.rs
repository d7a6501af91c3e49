//! Invocation result domain type

use serde::{Deserialize, Serialize};

use crate::domain::analysis::{AnalysisResult, RemediationVerdict};

/// Status code of every invocation that reaches the emitter
pub const SUCCESS_STATUS: u16 = 200;

pub const ACTION_TAKEN: &str = "action taken";
pub const NO_ACTION_REQUIRED: &str = "no action required";

/// Externally visible outcome of one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResult {
    pub status_code: u16,
    pub analysis: String,
    pub action_taken: String,
}

impl InvocationResult {
    /// Builds the result once the verdict has been acted on
    pub fn emit(analysis: AnalysisResult, verdict: RemediationVerdict) -> Self {
        let action_taken = match verdict {
            RemediationVerdict::Remediate => ACTION_TAKEN,
            RemediationVerdict::NoAction => NO_ACTION_REQUIRED,
        };

        Self {
            status_code: SUCCESS_STATUS,
            analysis: analysis.into_string(),
            action_taken: action_taken.to_string(),
        }
    }
}
