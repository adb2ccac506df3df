//! Prediction payloads

use serde::{Deserialize, Serialize};

use crate::pipeline::Assessment;
use crate::risk::RiskCategory;

/// Successful `/predict` response
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictResponse {
    pub status: String,
    pub risk_score: f64,
    pub result: RiskCategory,
}

impl From<Assessment> for PredictResponse {
    fn from(a: Assessment) -> Self {
        Self {
            status: "success".to_string(),
            risk_score: a.risk_score,
            result: a.category,
        }
    }
}

/// Failure payload shared by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_wire_format() {
        let resp = PredictResponse::from(Assessment::from_probability(0.6666));
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"status": "success", "risk_score": 66.7, "result": "Moderate Risk"})
        );
    }
}
