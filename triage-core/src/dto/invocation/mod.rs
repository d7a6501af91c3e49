//! Invocation DTOs exchanged with the hosting runtime

use serde::{Deserialize, Serialize};

use crate::domain::invocation::InvocationResult;

/// Response document posted back for a successful invocation
///
/// `body` is itself a JSON string of `{ analysis, actionTaken }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub status_code: u16,
    pub body: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponseBody {
    analysis: String,
    action_taken: String,
}

impl From<&InvocationResult> for InvocationResponse {
    fn from(result: &InvocationResult) -> Self {
        let body = serde_json::json!({
            "analysis": result.analysis,
            "actionTaken": result.action_taken,
        });

        Self {
            status_code: result.status_code,
            body: body.to_string(),
        }
    }
}

impl InvocationResponse {
    /// Recovers the structured result from the encoded body
    pub fn to_result(&self) -> Result<InvocationResult, serde_json::Error> {
        let body: ResponseBody = serde_json::from_str(&self.body)?;
        Ok(InvocationResult {
            status_code: self.status_code,
            analysis: body.analysis,
            action_taken: body.action_taken,
        })
    }
}

/// Error document posted back when an invocation aborts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationError {
    pub error_message: String,
    pub error_type: String,
}

impl InvocationError {
    pub fn new(error_type: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            error_message: error_message.into(),
            error_type: error_type.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::{AnalysisResult, RemediationVerdict};

    #[test]
    fn test_response_wire_shape() {
        let result = InvocationResult::emit(
            AnalysisResult::new("Severity: high, restart recommended"),
            RemediationVerdict::Remediate,
        );

        let response = InvocationResponse::from(&result);
        let wire = serde_json::to_value(&response).unwrap();

        assert_eq!(wire["statusCode"], 200);
        let body: serde_json::Value =
            serde_json::from_str(wire["body"].as_str().unwrap()).unwrap();
        assert_eq!(body["analysis"], "Severity: high, restart recommended");
        assert_eq!(body["actionTaken"], "action taken");

        assert_eq!(response.to_result().unwrap(), result);
    }

    #[test]
    fn test_error_wire_shape() {
        let error = InvocationError::new("DecodeError", "record 0: bad");
        let wire = serde_json::to_value(&error).unwrap();
        assert_eq!(wire["errorType"], "DecodeError");
        assert_eq!(wire["errorMessage"], "record 0: bad");
    }
}
