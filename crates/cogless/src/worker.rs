//! File worker loop.
//!
//! Runs setup once, then serves `request-<id>.json` files from the working
//! directory one at a time until the `stop` marker appears. The parent is
//! told about every transition through a [`Notifier`]:
//!
//! ```text
//! setup ok ─► Ready ─► [Busy ─► Ready]* ─► exit 0
//! setup failed ─► exit 1 (no notifications)
//! ```

use std::io;
use std::sync::{Arc, Mutex};

use crate::config::WorkerConfig;
use crate::health::{SetupResult, WorkerState};
use crate::notify::{Notifier, WorkerSignal};
use crate::prediction::{PredictionOutput, PredictionRequest, PredictionResponse};
use crate::predictor::LoadedPredictor;
use crate::runner::Runner;
use crate::working_dir::{
    OPENAPI_FILE, PendingRequest, SETUP_RESULT_FILE, WorkingDir, response_file_name,
};

/// Setup phase errors.
///
/// These occur during predictor loading and setup, before any request is
/// served. They end the worker with exit code 1.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// Failed to resolve or instantiate the predictor.
    #[error("failed to load predictor: {message}")]
    Load { message: String },

    /// The declared shape is unusable.
    #[error("invalid predictor schema: {message}")]
    Schema { message: String },

    /// The predictor's setup() returned an error or panicked.
    #[error("setup failed: {message}")]
    Setup { message: String },

    /// Internal error (e.g., the blocking task was lost).
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl SetupError {
    pub fn load(message: impl Into<String>) -> Self {
        Self::Load {
            message: message.into(),
        }
    }

    pub fn schema(message: impl Into<String>) -> Self {
        Self::Schema {
            message: message.into(),
        }
    }

    pub fn setup(message: impl Into<String>) -> Self {
        Self::Setup {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Failures outside any single request. These stop the worker.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to send {signal:?} notification: {source}")]
    Notify {
        signal: WorkerSignal,
        #[source]
        source: io::Error,
    },
}

impl WorkerError {
    fn io(context: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

/// How the worker ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// Stop marker seen after a successful setup.
    Stopped,
    /// Setup failed; nothing was served.
    SetupFailed,
}

impl WorkerExit {
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Stopped => 0,
            Self::SetupFailed => 1,
        }
    }
}

type SharedRunner = Arc<Mutex<Runner>>;

/// Run the file worker until stopped or setup fails.
///
/// `loader` resolves the predictor; it runs on the blocking pool together
/// with setup.
pub async fn run_file_worker<F>(
    config: WorkerConfig,
    loader: F,
    notifier: Arc<dyn Notifier>,
) -> Result<WorkerExit, WorkerError>
where
    F: FnOnce() -> anyhow::Result<LoadedPredictor> + Send + 'static,
{
    tracing::info!(
        working_dir = %config.working_dir.display(),
        module_name = %config.module_name,
        class_name = %config.class_name,
        "Starting file worker"
    );
    let mut state = WorkerState::Starting;

    let dir = WorkingDir::prepare(&config.working_dir)
        .await
        .map_err(|e| WorkerError::io("failed to prepare working directory", e))?;

    transition(&mut state, WorkerState::SettingUp);
    let setup_result = SetupResult::starting();
    let runner = match setup(&dir, &config, loader).await {
        Ok(runner) => {
            tracing::info!("Setup completed");
            dir.write_json(SETUP_RESULT_FILE, &setup_result.succeeded())
                .await
                .map_err(|e| WorkerError::io("failed to write setup result", e))?;
            runner
        }
        Err(e) => {
            tracing::error!(error = %e, "Setup failed");
            dir.write_json(SETUP_RESULT_FILE, &setup_result.failed())
                .await
                .map_err(|e| WorkerError::io("failed to write setup result", e))?;
            transition(&mut state, WorkerState::SetupFailed);
            return Ok(WorkerExit::SetupFailed);
        }
    };

    send(notifier.as_ref(), WorkerSignal::Ready)?;
    transition(&mut state, WorkerState::Idle);

    loop {
        let scan = dir
            .scan()
            .await
            .map_err(|e| WorkerError::io("failed to list working directory", e))?;
        if scan.stop {
            tracing::info!("Stopping file worker");
            transition(&mut state, WorkerState::Stopped);
            return Ok(WorkerExit::Stopped);
        }
        if scan.requests.is_empty() {
            tokio::time::sleep(config.poll_interval).await;
            continue;
        }

        for request in scan.requests {
            if dir.stop_requested().await {
                tracing::info!("Stopping file worker");
                transition(&mut state, WorkerState::Stopped);
                return Ok(WorkerExit::Stopped);
            }

            send(notifier.as_ref(), WorkerSignal::Busy)?;
            transition(&mut state, WorkerState::Processing);

            let response = handle_request(&runner, &request).await;

            dir.remove_if_exists(&request.path)
                .await
                .map_err(|e| WorkerError::io(format!("failed to remove {}", request.path.display()), e))?;
            dir.write_json(&response_file_name(&request.id), &response)
                .await
                .map_err(|e| WorkerError::io(format!("failed to write response for {}", request.id), e))?;

            send(notifier.as_ref(), WorkerSignal::Ready)?;
            transition(&mut state, WorkerState::Idle);
        }
    }
}

fn transition(state: &mut WorkerState, next: WorkerState) {
    tracing::debug!(from = state.as_str(), to = next.as_str(), "Worker state");
    *state = next;
}

fn send(notifier: &dyn Notifier, signal: WorkerSignal) -> Result<(), WorkerError> {
    notifier
        .notify(signal)
        .map_err(|source| WorkerError::Notify { signal, source })
}

/// Load the predictor, publish its schema, then run its setup.
async fn setup<F>(dir: &WorkingDir, config: &WorkerConfig, loader: F) -> Result<SharedRunner, SetupError>
where
    F: FnOnce() -> anyhow::Result<LoadedPredictor> + Send + 'static,
{
    tracing::info!("Setup started");
    let loaded = tokio::task::spawn_blocking(loader)
        .await
        .map_err(|e| SetupError::internal(format!("predictor loader did not finish: {e}")))?
        .map_err(|e| SetupError::load(format!("{e:#}")))?;

    let schema = cogless_schema::to_json_schema(&loaded.info);
    dir.write_json(OPENAPI_FILE, &schema)
        .await
        .map_err(|e| SetupError::internal(format!("failed to write {OPENAPI_FILE}: {e}")))?;

    let mut runner = Runner::new(loaded).map_err(|e| SetupError::schema(e.to_string()))?;
    let weights = config.weights.clone();
    let runner = tokio::task::spawn_blocking(move || runner.setup_with(&weights).map(|()| runner))
        .await
        .map_err(|e| SetupError::setup(join_error_message(e)))?
        .map_err(|e| SetupError::setup(format!("{e:#}")))?;

    Ok(Arc::new(Mutex::new(runner)))
}

/// Run one request. Every failure ends up in the response.
async fn handle_request(runner: &SharedRunner, request: &PendingRequest) -> PredictionResponse {
    let started_at = chrono::Utc::now().to_rfc3339();
    tracing::info!(id = %request.id, "Prediction started");

    match predict(runner, request).await {
        Ok(output) => {
            tracing::info!(id = %request.id, "Prediction completed");
            PredictionResponse::succeeded(started_at, output)
        }
        Err(error) => {
            tracing::error!(id = %request.id, %error, "Prediction failed");
            PredictionResponse::failed(started_at, error)
        }
    }
}

async fn predict(runner: &SharedRunner, request: &PendingRequest) -> Result<PredictionOutput, String> {
    let bytes = tokio::fs::read(&request.path)
        .await
        .map_err(|e| format!("failed to read request: {e}"))?;
    let request: PredictionRequest =
        serde_json::from_slice(&bytes).map_err(|e| format!("invalid request: {e}"))?;

    let runner = Arc::clone(runner);
    tokio::task::spawn_blocking(move || {
        let mut runner = runner.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("Runner lock poisoned by an earlier panic, continuing");
            poisoned.into_inner()
        });
        runner.predict_json(request.input)
    })
    .await
    .map_err(join_error_message)?
    .map_err(|e| e.to_string())
}

fn join_error_message(e: tokio::task::JoinError) -> String {
    if !e.is_panic() {
        return format!("task failed: {e}");
    }
    let payload = e.into_panic();
    let msg = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("predictor panicked: {msg}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes() {
        assert_eq!(WorkerExit::Stopped.exit_code(), 0);
        assert_eq!(WorkerExit::SetupFailed.exit_code(), 1);
    }

    #[test]
    fn setup_error_display() {
        assert_eq!(
            SetupError::load("no module named nope").to_string(),
            "failed to load predictor: no module named nope"
        );
        assert_eq!(SetupError::setup("boom").to_string(), "setup failed: boom");
    }

    #[tokio::test]
    async fn join_error_carries_panic_message() {
        let err = tokio::task::spawn_blocking(|| panic!("kaboom")).await.unwrap_err();
        assert_eq!(join_error_message(err), "predictor panicked: kaboom");
    }
}
