//! Sleeps for a while, then decorates its input.
//!
//! Behaviour is tuned through the environment so a parent-side test can
//! exercise slow setup, failed setup and failed predictions:
//!
//! - `SETUP_SLEEP`: seconds to sleep in setup
//! - `SETUP_FAILURE`: fail setup when set
//! - `PREDICTION_FAILURE`: fail every prediction when set

use std::time::Duration;

use cogless::{LoadedPredictor, PredictArgs, PredictOutput, Predictor, Weights};
use cogless_schema::{FieldType, InputField, OutputType, PredictorInfo, PrimitiveType};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SleepOptions {
    pub setup_sleep: Duration,
    pub setup_failure: bool,
    pub prediction_failure: bool,
}

impl SleepOptions {
    pub fn from_env() -> Self {
        let setup_sleep = std::env::var("SETUP_SLEEP")
            .ok()
            .and_then(|s| s.parse::<f64>().ok())
            .filter(|secs| secs.is_finite() && *secs > 0.0)
            .map(Duration::from_secs_f64)
            .unwrap_or_default();
        Self {
            setup_sleep,
            setup_failure: std::env::var_os("SETUP_FAILURE").is_some(),
            prediction_failure: std::env::var_os("PREDICTION_FAILURE").is_some(),
        }
    }
}

#[derive(Debug, Default)]
pub struct SleepPredictor {
    options: SleepOptions,
    setup_done: bool,
}

impl SleepPredictor {
    pub fn new(options: SleepOptions) -> Self {
        Self {
            options,
            setup_done: false,
        }
    }
}

pub fn info() -> PredictorInfo {
    PredictorInfo::new("sleep", "Predictor", OutputType::single(PrimitiveType::String))
        .input(
            InputField::new("i", FieldType::required(PrimitiveType::Integer))
                .ge(0.0)
                .description("seconds to sleep"),
        )
        .input(InputField::new("s", FieldType::required(PrimitiveType::String)))
}

pub fn load() -> LoadedPredictor {
    LoadedPredictor::new(info(), SleepPredictor::new(SleepOptions::from_env()))
}

impl Predictor for SleepPredictor {
    fn setup(&mut self, _weights: Option<Weights>) -> anyhow::Result<()> {
        if !self.options.setup_sleep.is_zero() {
            std::thread::sleep(self.options.setup_sleep);
        }
        if self.options.setup_failure {
            anyhow::bail!("setup failed");
        }
        self.setup_done = true;
        Ok(())
    }

    fn predict(&mut self, args: PredictArgs) -> anyhow::Result<PredictOutput> {
        let secs = args.int("i")?;
        let s = args.str("s")?;
        std::thread::sleep(Duration::from_secs(secs.max(0) as u64));
        if self.options.prediction_failure {
            anyhow::bail!("prediction failed");
        }
        Ok(PredictOutput::value(format!("*{s}*")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogless::{Runner, WeightsSource};
    use serde_json::json;

    fn runner(options: SleepOptions) -> Runner {
        Runner::new(LoadedPredictor::new(info(), SleepPredictor::new(options))).unwrap()
    }

    fn input(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn decorates_input() {
        let mut runner = runner(SleepOptions::default());
        runner.setup_with(&WeightsSource::default()).unwrap();
        let output = runner.predict_json(input(json!({"i": 0, "s": "bar"}))).unwrap();
        assert_eq!(output, cogless::PredictionOutput::Single(json!("*bar*")));
    }

    #[test]
    fn setup_failure() {
        let mut runner = runner(SleepOptions {
            setup_failure: true,
            ..Default::default()
        });
        let err = runner.setup_with(&WeightsSource::default()).unwrap_err();
        assert_eq!(err.to_string(), "setup failed");
    }

    #[test]
    fn prediction_failure() {
        let mut runner = runner(SleepOptions {
            prediction_failure: true,
            ..Default::default()
        });
        runner.setup_with(&WeightsSource::default()).unwrap();
        let err = runner.predict_json(input(json!({"i": 0, "s": "bar"}))).unwrap_err();
        assert_eq!(err.to_string(), "prediction failed");
    }

    #[test]
    fn setup_marks_done() {
        let mut predictor = SleepPredictor::new(SleepOptions::default());
        assert!(!predictor.setup_done);
        predictor.setup(None).unwrap();
        assert!(predictor.setup_done);
    }

    #[test]
    fn negative_sleep_is_rejected() {
        let mut runner = runner(SleepOptions::default());
        let err = runner.predict_json(input(json!({"i": -1, "s": "x"}))).unwrap_err();
        assert_eq!(err.to_string(), "not all values >= 0 for: i");
    }
}
