//! Secret inputs and a secret output.

use cogless::{LoadedPredictor, PredictArgs, PredictOutput, Predictor, Secret, Value, Weights};
use cogless_schema::{FieldType, InputField, OutputType, PredictorInfo, PrimitiveType};
use serde_json::json;

#[derive(Debug, Default)]
pub struct SecretsPredictor;

pub fn info() -> PredictorInfo {
    PredictorInfo::new("secrets", "Predictor", OutputType::single(PrimitiveType::Secret))
        .input(InputField::new("s1", FieldType::required(PrimitiveType::Secret)))
        .input(InputField::new("s2", FieldType::optional(PrimitiveType::Secret)).default(json!(null)))
        .input(InputField::new("s3", FieldType::required(PrimitiveType::Secret)).default(json!("123456")))
        .input(
            InputField::new("ss", FieldType::repeated(PrimitiveType::Secret))
                .default(json!(["foo", "bar"])),
        )
}

pub fn load() -> LoadedPredictor {
    LoadedPredictor::new(info(), SecretsPredictor)
}

impl Predictor for SecretsPredictor {
    fn setup(&mut self, _weights: Option<Weights>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Joins every secret it was given into a new secret.
    fn predict(&mut self, args: PredictArgs) -> anyhow::Result<PredictOutput> {
        let mut parts = vec![args.secret("s1")?.expose().to_string()];
        if let Some(s2) = args.get("s2")?.as_secret() {
            parts.push(s2.expose().to_string());
        }
        parts.push(args.secret("s3")?.expose().to_string());
        for s in args.list("ss")? {
            if let Some(s) = s.as_secret() {
                parts.push(s.expose().to_string());
            }
        }
        Ok(PredictOutput::Value(Value::Secret(Secret::new(parts.join(":")))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogless::{PredictionOutput, Runner, WeightsSource};
    use cogless_schema::REDACTED;

    fn runner() -> Runner {
        let mut runner = Runner::new(load()).unwrap();
        runner.setup_with(&WeightsSource::default()).unwrap();
        runner
    }

    #[test]
    fn secrets_reach_the_predictor() {
        let value = runner()
            .predict([("s1".to_string(), Value::from("a"))].into_iter().collect())
            .unwrap();
        assert_eq!(value.as_secret().unwrap().expose(), "a:123456:foo:bar");
    }

    #[test]
    fn secret_output_is_redacted_on_the_wire() {
        let output = runner()
            .predict_json(json!({"s1": "a", "s2": "b"}).as_object().cloned().unwrap())
            .unwrap();
        assert_eq!(output, PredictionOutput::Single(json!(REDACTED)));
    }

    #[test]
    fn schema_redacts_defaults() {
        let schema = cogless_schema::to_json_input(&info());
        assert_eq!(schema["properties"]["s3"]["default"], json!(REDACTED));
        assert_eq!(schema["properties"]["ss"]["default"], json!([REDACTED, REDACTED]));
    }
}
