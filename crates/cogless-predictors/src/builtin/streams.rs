//! Streaming predictors: a typed iterator and a concatenating text stream.

use cogless::{LoadedPredictor, PredictArgs, PredictOutput, Predictor, Value, Weights};
use cogless_schema::{FieldType, InputField, OutputType, PredictorInfo, PrimitiveType};
use serde_json::json;

/// Yields `"{s}-{k}"` for `k` in `0..n`.
#[derive(Debug, Default)]
pub struct Counter;

pub fn iterator_info() -> PredictorInfo {
    PredictorInfo::new("iterator", "Predictor", OutputType::iterator(PrimitiveType::String))
        .input(
            InputField::new("n", FieldType::required(PrimitiveType::Integer))
                .ge(0.0)
                .default(json!(3)),
        )
        .input(InputField::new("s", FieldType::required(PrimitiveType::String)))
}

pub fn load_iterator() -> LoadedPredictor {
    LoadedPredictor::new(iterator_info(), Counter)
}

impl Predictor for Counter {
    fn setup(&mut self, _weights: Option<Weights>) -> anyhow::Result<()> {
        Ok(())
    }

    fn predict(&mut self, args: PredictArgs) -> anyhow::Result<PredictOutput> {
        let n = args.int("n")?;
        let s = args.str("s")?.to_string();
        Ok(PredictOutput::stream(
            (0..n).map(move |k| Ok(Value::from(format!("{s}-{k}")))),
        ))
    }
}

/// Streams a prompt back token by token, the way a text model would.
#[derive(Debug, Default)]
pub struct Tokens;

pub fn concat_info() -> PredictorInfo {
    PredictorInfo::new("concat", "Predictor", OutputType::concatenate_iterator())
        .input(InputField::new("prompt", FieldType::required(PrimitiveType::String)))
}

pub fn load_concat() -> LoadedPredictor {
    LoadedPredictor::new(concat_info(), Tokens)
}

impl Predictor for Tokens {
    fn setup(&mut self, _weights: Option<Weights>) -> anyhow::Result<()> {
        Ok(())
    }

    fn predict(&mut self, args: PredictArgs) -> anyhow::Result<PredictOutput> {
        let tokens: Vec<Value> = args
            .str("prompt")?
            .split_inclusive(' ')
            .map(Value::from)
            .collect();
        // A plain list is streamed just the same.
        Ok(PredictOutput::Value(Value::List(tokens)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cogless::{PredictionOutput, Runner, WeightsSource};

    fn runner(loaded: LoadedPredictor) -> Runner {
        let mut runner = Runner::new(loaded).unwrap();
        runner.setup_with(&WeightsSource::default()).unwrap();
        runner
    }

    fn input(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn iterator_yields_in_order() {
        let mut runner = runner(load_iterator());
        assert!(runner.is_iter());
        let values: Vec<Value> = runner
            .predict_iter([("s".to_string(), Value::from("x"))].into_iter().collect())
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(values, vec![Value::from("x-0"), Value::from("x-1"), Value::from("x-2")]);
    }

    #[test]
    fn iterator_rejects_predict() {
        let mut runner = runner(load_iterator());
        let err = runner
            .predict([("s".to_string(), Value::from("x"))].into_iter().collect())
            .unwrap_err();
        assert_eq!(err.to_string(), "predict returns iterator, call predict_iter instead");
    }

    #[test]
    fn concat_drains_tokens() {
        let mut runner = runner(load_concat());
        let output = runner.predict_json(input(json!({"prompt": "a b c"}))).unwrap();
        assert_eq!(output, PredictionOutput::Stream(vec![json!("a "), json!("b "), json!("c")]));
    }

    #[test]
    fn empty_stream() {
        let mut runner = runner(load_iterator());
        let output = runner.predict_json(input(json!({"n": 0, "s": "x"}))).unwrap();
        assert_eq!(output, PredictionOutput::Stream(vec![]));
    }
}
