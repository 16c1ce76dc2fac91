//! Exercises every input constraint and default kind.

use cogless::{LoadedPredictor, PredictArgs, PredictOutput, Predictor, Weights};
use cogless_schema::{FieldType, InputField, OutputType, PredictorInfo, PrimitiveType};
use serde_json::json;

#[derive(Debug, Default)]
pub struct ConstraintsPredictor;

pub fn info() -> PredictorInfo {
    PredictorInfo::new("constraints", "Predictor", OutputType::single(PrimitiveType::String))
        .input(
            InputField::new("steps", FieldType::required(PrimitiveType::Integer))
                .ge(1.0)
                .le(50.0)
                .default(json!(10))
                .description("number of steps"),
        )
        .input(
            InputField::new("scale", FieldType::required(PrimitiveType::Float))
                .ge(0.0)
                .le(1.0)
                .default(json!(0.5)),
        )
        .input(
            InputField::new("name", FieldType::required(PrimitiveType::String))
                .min_length(1)
                .max_length(8)
                .regex("[a-z]+"),
        )
        .input(
            InputField::new("mode", FieldType::required(PrimitiveType::String))
                .choices(vec![json!("fast"), json!("slow")])
                .default(json!("fast")),
        )
        .input(
            InputField::new("seeds", FieldType::repeated(PrimitiveType::Integer))
                .ge(0.0)
                .default(json!([])),
        )
        .input(InputField::new("label", FieldType::optional(PrimitiveType::String)).default(json!(null)))
}

pub fn load() -> LoadedPredictor {
    LoadedPredictor::new(info(), ConstraintsPredictor)
}

impl Predictor for ConstraintsPredictor {
    fn setup(&mut self, _weights: Option<Weights>) -> anyhow::Result<()> {
        Ok(())
    }

    fn predict(&mut self, args: PredictArgs) -> anyhow::Result<PredictOutput> {
        let seeds: Vec<String> = args
            .list("seeds")?
            .iter()
            .map(ToString::to_string)
            .collect();
        let label = args.get("label")?;
        let label = if label.is_null() { "-".to_string() } else { label.to_string() };
        Ok(PredictOutput::value(format!(
            "{name} {mode} steps={steps} scale={scale} seeds=[{seeds}] label={label}",
            name = args.str("name")?,
            mode = args.str("mode")?,
            steps = args.int("steps")?,
            scale = args.float("scale")?,
            seeds = seeds.join(","),
        )))
    }
}
