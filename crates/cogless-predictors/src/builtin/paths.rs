//! Path inputs and a list-of-paths output.
//!
//! Writes `n` copies of its input file into a scratch directory and returns
//! their paths. Responses carry the paths, never the file contents.

use std::path::PathBuf;

use anyhow::Context as _;
use cogless::{LoadedPredictor, PredictArgs, PredictOutput, Predictor, Value, Weights};
use cogless_schema::{FieldType, InputField, OutputType, PredictorInfo, PrimitiveType};
use serde_json::json;

#[derive(Debug)]
pub struct PathsPredictor {
    out_dir: PathBuf,
    calls: u64,
}

impl PathsPredictor {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
            calls: 0,
        }
    }
}

pub fn info() -> PredictorInfo {
    PredictorInfo::new("paths", "Predictor", OutputType::list(PrimitiveType::Path))
        .input(InputField::new("p", FieldType::required(PrimitiveType::Path)))
        .input(
            InputField::new("n", FieldType::required(PrimitiveType::Integer))
                .ge(0.0)
                .le(16.0)
                .default(json!(2)),
        )
}

pub fn load() -> LoadedPredictor {
    let out_dir = std::env::temp_dir().join(format!("cogless-paths-{}", std::process::id()));
    LoadedPredictor::new(info(), PathsPredictor::new(out_dir))
}

impl Predictor for PathsPredictor {
    fn setup(&mut self, _weights: Option<Weights>) -> anyhow::Result<()> {
        std::fs::create_dir_all(&self.out_dir)
            .with_context(|| format!("failed to create {}", self.out_dir.display()))
    }

    fn predict(&mut self, args: PredictArgs) -> anyhow::Result<PredictOutput> {
        let src = args.path("p")?;
        let n = args.int("n")?;
        let contents =
            std::fs::read(src).with_context(|| format!("failed to read {}", src.display()))?;
        let ext = src.extension().and_then(|e| e.to_str()).unwrap_or("bin");

        self.calls += 1;
        let mut outputs = Vec::new();
        for k in 0..n {
            let dst = self.out_dir.join(format!("out-{}-{k}.{ext}", self.calls));
            std::fs::write(&dst, &contents)
                .with_context(|| format!("failed to write {}", dst.display()))?;
            outputs.push(Value::Path(dst));
        }
        Ok(PredictOutput::Value(Value::List(outputs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogless::{PredictionOutput, Runner, WeightsSource};

    #[test]
    fn responses_carry_output_paths() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        std::fs::write(&input, "hi").unwrap();

        let loaded = LoadedPredictor::new(info(), PathsPredictor::new(dir.path().join("out")));
        let mut runner = Runner::new(loaded).unwrap();
        runner.setup_with(&WeightsSource::default()).unwrap();

        let output = runner
            .predict_json(json!({"p": input}).as_object().cloned().unwrap())
            .unwrap();
        let out = dir.path().join("out");
        let expected: Vec<String> = ["out-1-0.txt", "out-1-1.txt"]
            .iter()
            .map(|name| out.join(name).display().to_string())
            .collect();
        assert_eq!(output, PredictionOutput::Single(json!(expected)));
        assert_eq!(std::fs::read_to_string(out.join("out-1-1.txt")).unwrap(), "hi");
    }

    #[test]
    fn missing_input_file_fails_the_prediction() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = LoadedPredictor::new(info(), PathsPredictor::new(dir.path()));
        let mut runner = Runner::new(loaded).unwrap();
        runner.setup_with(&WeightsSource::default()).unwrap();

        let missing = dir.path().join("nope.txt");
        let err = runner
            .predict_json(json!({"p": missing, "n": 1}).as_object().cloned().unwrap())
            .unwrap_err();
        assert!(err.to_string().starts_with("failed to read"));
    }
}
