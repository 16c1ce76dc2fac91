//! Structured output with required and optional fields.

use indexmap::IndexMap;

use cogless::{LoadedPredictor, PredictArgs, PredictOutput, Predictor, Value, Weights};
use cogless_schema::{FieldType, InputField, OutputType, PredictorInfo, PrimitiveType};

#[derive(Debug, Default)]
pub struct ObjectPredictor;

pub fn info() -> PredictorInfo {
    PredictorInfo::new(
        "object",
        "Predictor",
        OutputType::object([
            ("text", FieldType::required(PrimitiveType::String)),
            ("length", FieldType::required(PrimitiveType::Integer)),
            ("words", FieldType::repeated(PrimitiveType::String)),
            ("first", FieldType::optional(PrimitiveType::String)),
        ]),
    )
    .input(InputField::new("text", FieldType::required(PrimitiveType::String)))
}

pub fn load() -> LoadedPredictor {
    LoadedPredictor::new(info(), ObjectPredictor)
}

impl Predictor for ObjectPredictor {
    fn setup(&mut self, _weights: Option<Weights>) -> anyhow::Result<()> {
        Ok(())
    }

    fn predict(&mut self, args: PredictArgs) -> anyhow::Result<PredictOutput> {
        let text = args.str("text")?;
        let words: Vec<Value> = text.split_whitespace().map(Value::from).collect();
        let first = words.first().cloned().unwrap_or(Value::Null);

        let mut fields = IndexMap::new();
        fields.insert("text".to_string(), Value::from(text));
        fields.insert("length".to_string(), Value::Integer(text.chars().count() as i64));
        fields.insert("words".to_string(), Value::List(words));
        fields.insert("first".to_string(), first);
        Ok(PredictOutput::Value(Value::Object(fields)))
    }
}
