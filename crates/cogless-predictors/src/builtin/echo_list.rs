//! Echoes a list of integers back.

use cogless::{LoadedPredictor, PredictArgs, PredictOutput, Predictor, Value, Weights};
use cogless_schema::{FieldType, InputField, OutputType, PredictorInfo, PrimitiveType};

#[derive(Debug, Default)]
pub struct EchoList;

pub fn info() -> PredictorInfo {
    PredictorInfo::new("echo_list", "Predictor", OutputType::list(PrimitiveType::Integer))
        .input(InputField::new("xs", FieldType::repeated(PrimitiveType::Integer)))
}

pub fn load() -> LoadedPredictor {
    LoadedPredictor::new(info(), EchoList)
}

impl Predictor for EchoList {
    fn setup(&mut self, _weights: Option<Weights>) -> anyhow::Result<()> {
        Ok(())
    }

    fn predict(&mut self, args: PredictArgs) -> anyhow::Result<PredictOutput> {
        Ok(PredictOutput::Value(Value::List(args.list("xs")?.to_vec())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogless::{PredictionOutput, Runner, WeightsSource};
    use serde_json::json;

    fn run(input: serde_json::Value) -> Result<PredictionOutput, cogless::RunnerError> {
        let mut runner = Runner::new(load()).unwrap();
        runner.setup_with(&WeightsSource::default()).unwrap();
        runner.predict_json(input.as_object().cloned().unwrap())
    }

    #[test]
    fn echoes() {
        assert_eq!(
            run(json!({"xs": [1, 2, 3]})).unwrap(),
            PredictionOutput::Single(json!([1, 2, 3]))
        );
        assert_eq!(run(json!({"xs": []})).unwrap(), PredictionOutput::Single(json!([])));
    }

    #[test]
    fn rejects_non_list_and_bad_elements() {
        assert_eq!(
            run(json!({"xs": 1})).unwrap_err().to_string(),
            "incompatible input for: xs"
        );
        assert_eq!(
            run(json!({"xs": [1, "2"]})).unwrap_err().to_string(),
            "incompatible input for: xs"
        );
    }
}
