//! Worker configuration.

use std::path::PathBuf;
use std::time::Duration;

use crate::weights::WeightsSource;

/// Pause between scans that found no request.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub working_dir: PathBuf,
    pub module_name: String,
    pub class_name: String,
    pub poll_interval: Duration,
    pub weights: WeightsSource,
}

impl WorkerConfig {
    /// Config with the default poll interval and weights from the environment.
    pub fn new(
        working_dir: impl Into<PathBuf>,
        module_name: impl Into<String>,
        class_name: impl Into<String>,
    ) -> Self {
        Self {
            working_dir: working_dir.into(),
            module_name: module_name.into(),
            class_name: class_name.into(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            weights: WeightsSource::from_env(),
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_weights(mut self, weights: WeightsSource) -> Self {
        self.weights = weights;
        self
    }
}
