//! cogless: file-based prediction worker for cog-style predictors.
//!
//! A [`Runner`] owns one predictor and validates everything going in and out
//! of it. [`run_file_worker`] serves a runner over a working directory,
//! announcing ready/busy transitions to the parent process.

mod config;
mod health;
mod input_validation;
mod logging;
mod notify;
mod output;
mod prediction;
mod predictor;
mod runner;
mod value;
mod weights;

pub mod worker;
pub mod working_dir;

pub use config::{DEFAULT_POLL_INTERVAL, WorkerConfig};
pub use health::{SetupResult, SetupStatus, WorkerState};
pub use input_validation::{InputValidator, check_and_normalize};
pub use logging::init_tracing;
#[cfg(unix)]
pub use notify::ParentProcessNotifier;
pub use notify::{ChannelNotifier, Notifier, WorkerSignal};
pub use output::{check_element, check_output, check_value};
pub use prediction::{PredictionOutput, PredictionRequest, PredictionResponse, PredictionStatus};
pub use predictor::{
    LoadedPredictor, PredictArgs, PredictOutput, Predictor, ValueStream, Weights,
};
pub use runner::{OutputStream, Runner, RunnerError};
pub use value::{Secret, Value};
pub use weights::{WEIGHTS_ENV, WEIGHTS_PATH, WeightsSource};
pub use worker::{SetupError, WorkerError, WorkerExit, run_file_worker};

/// cogless version from Cargo.toml
pub const COGLESS_VERSION: &str = env!("CARGO_PKG_VERSION");
