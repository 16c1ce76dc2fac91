//! Request and response files exchanged with the parent.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PredictionStatus {
    Succeeded,
    Failed,
}

impl PredictionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

/// Prediction output - single value or streamed chunks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PredictionOutput {
    Single(serde_json::Value),
    Stream(Vec<serde_json::Value>),
}

/// Contents of `request-<id>.json`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PredictionRequest {
    pub input: serde_json::Map<String, serde_json::Value>,
}

/// Contents of `response-<id>.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// When the prediction started (ISO 8601 format).
    pub started_at: String,
    pub completed_at: String,
    pub status: PredictionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<PredictionOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PredictionResponse {
    pub fn succeeded(started_at: String, output: PredictionOutput) -> Self {
        Self {
            started_at,
            completed_at: chrono::Utc::now().to_rfc3339(),
            status: PredictionStatus::Succeeded,
            output: Some(output),
            error: None,
        }
    }

    pub fn failed(started_at: String, error: impl Into<String>) -> Self {
        Self {
            started_at,
            completed_at: chrono::Utc::now().to_rfc3339(),
            status: PredictionStatus::Failed,
            output: None,
            error: Some(error.into()),
        }
    }
}
