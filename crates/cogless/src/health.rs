//! Worker lifecycle state and the setup result file.

use serde::{Deserialize, Serialize};

/// Where the worker is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WorkerState {
    /// Preparing the working directory
    #[default]
    Starting,
    /// Loading the predictor and running setup()
    SettingUp,
    /// setup() failed, terminal
    SetupFailed,
    /// Waiting for requests
    Idle,
    /// Running one prediction
    Processing,
    /// Stop marker seen, terminal
    Stopped,
}

impl WorkerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Starting => "starting",
            Self::SettingUp => "setting_up",
            Self::SetupFailed => "setup_failed",
            Self::Idle => "idle",
            Self::Processing => "processing",
            Self::Stopped => "stopped",
        }
    }
}

/// Status of the setup phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SetupStatus {
    Succeeded,
    Failed,
}

/// Contents of `setup_result.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupResult {
    /// When setup started (ISO 8601 format).
    pub started_at: String,
    /// When setup completed (ISO 8601 format), if finished.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<SetupStatus>,
}

impl SetupResult {
    /// Create a new SetupResult with the current time as started_at.
    pub fn starting() -> Self {
        Self {
            started_at: chrono::Utc::now().to_rfc3339(),
            completed_at: None,
            status: None,
        }
    }

    pub fn succeeded(mut self) -> Self {
        self.completed_at = Some(chrono::Utc::now().to_rfc3339());
        self.status = Some(SetupStatus::Succeeded);
        self
    }

    pub fn failed(mut self) -> Self {
        self.completed_at = Some(chrono::Utc::now().to_rfc3339());
        self.status = Some(SetupStatus::Failed);
        self
    }
}
