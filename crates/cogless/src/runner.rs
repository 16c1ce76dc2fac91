//! Invocation engine: owns one predictor and mediates every call into it.

use indexmap::IndexMap;

use cogless_schema::{PredictorInfo, PrimitiveType};

use crate::input_validation::InputValidator;
use crate::output::{check_element, check_output, element_type};
use crate::prediction::PredictionOutput;
use crate::predictor::{LoadedPredictor, PredictOutput, Predictor, ValueStream};
use crate::value::Value;
use crate::weights::WeightsSource;

#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Bad input or output value.
    #[error("{0}")]
    Validation(String),

    /// A required input was omitted.
    #[error("missing default value for: {0}")]
    MissingDefault(String),

    /// predict() on a streaming predictor or the reverse.
    #[error("{0}")]
    Precondition(String),

    /// The declared shape itself is unusable.
    #[error("invalid predictor configuration: {0}")]
    Config(String),

    /// Raised by the predictor's own code.
    #[error(transparent)]
    Predictor(#[from] anyhow::Error),
}

pub struct Runner {
    info: PredictorInfo,
    predictor: Box<dyn Predictor>,
    inputs: InputValidator,
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("module_name", &self.info.module_name)
            .field("class_name", &self.info.class_name)
            .finish_non_exhaustive()
    }
}

impl Runner {
    pub fn new(loaded: LoadedPredictor) -> Result<Self, RunnerError> {
        let LoadedPredictor { info, predictor } = loaded;
        info.validate()
            .map_err(|e| RunnerError::Config(e.to_string()))?;
        let inputs = InputValidator::new(&info)?;
        Ok(Self {
            info,
            predictor,
            inputs,
        })
    }

    /// Run the predictor's setup with weights from the environment.
    pub fn setup(&mut self) -> Result<(), RunnerError> {
        self.setup_with(&WeightsSource::from_env())
    }

    /// Run the predictor's setup. Called once; errors are not retried.
    pub fn setup_with(&mut self, weights: &WeightsSource) -> Result<(), RunnerError> {
        let weights = if self.predictor.setup_weights() {
            let resolved = weights.resolve();
            tracing::debug!(?resolved, "Resolved weights");
            resolved
        } else {
            None
        };
        self.predictor.setup(weights)?;
        Ok(())
    }

    /// Streaming predictors yield their output incrementally.
    pub fn is_iter(&self) -> bool {
        self.info.is_iterator()
    }

    pub fn predict(&mut self, inputs: IndexMap<String, Value>) -> Result<Value, RunnerError> {
        if self.is_iter() {
            return Err(RunnerError::Precondition(
                "predict returns iterator, call predict_iter instead".into(),
            ));
        }
        let args = self.inputs.build_args(inputs)?;
        let value = match self.predictor.predict(args)? {
            PredictOutput::Value(value) => value,
            PredictOutput::Stream(_) => {
                return Err(RunnerError::Validation(
                    "incompatible output: predictor returned a stream".into(),
                ));
            }
        };
        check_output(&self.info.output, &value)?;
        Ok(value)
    }

    /// Lazily validated output of a streaming predictor.
    pub fn predict_iter(&mut self, inputs: IndexMap<String, Value>) -> Result<OutputStream, RunnerError> {
        if !self.is_iter() {
            return Err(RunnerError::Precondition(
                "predict does not return iterator, call predict instead".into(),
            ));
        }
        let primitive = element_type(&self.info.output)?;
        let args = self.inputs.build_args(inputs)?;
        let inner: ValueStream = match self.predictor.predict(args)? {
            PredictOutput::Stream(stream) => stream,
            // A plain list is iterable too.
            PredictOutput::Value(Value::List(items)) => {
                Box::new(items.into_iter().map(Ok::<Value, anyhow::Error>))
            }
            PredictOutput::Value(other) => {
                return Err(RunnerError::Validation(format!(
                    "incompatible output: {other} is not iterable"
                )));
            }
        };
        Ok(OutputStream {
            inner,
            primitive,
            done: false,
        })
    }

    /// Dispatch a request's JSON input and encode the result for a response.
    ///
    /// Streams are drained; the first bad element fails the whole prediction.
    pub fn predict_json(
        &mut self,
        input: serde_json::Map<String, serde_json::Value>,
    ) -> Result<PredictionOutput, RunnerError> {
        let inputs: IndexMap<String, Value> = input
            .into_iter()
            .map(|(k, v)| (k, Value::from(v)))
            .collect();

        if self.is_iter() {
            let values = self
                .predict_iter(inputs)?
                .map(|item| item.map(|v| v.to_json()))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(PredictionOutput::Stream(values))
        } else {
            Ok(PredictionOutput::Single(self.predict(inputs)?.to_json()))
        }
    }
}

/// Single-pass stream of validated output elements.
///
/// Element `k` is checked only when it is consumed. The stream ends after the
/// first error.
pub struct OutputStream {
    inner: ValueStream,
    primitive: PrimitiveType,
    done: bool,
}

impl Iterator for OutputStream {
    type Item = Result<Value, RunnerError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = match self.inner.next()? {
            Ok(value) => check_element(self.primitive, &value).map(|()| value),
            Err(e) => Err(RunnerError::Predictor(e)),
        };
        self.done = item.is_err();
        Some(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::{PredictArgs, Weights};
    use cogless_schema::{FieldType, InputField, OutputType};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    struct Echo {
        setup_calls: Arc<Mutex<Vec<Option<Weights>>>>,
        takes_weights: bool,
    }

    impl Predictor for Echo {
        fn setup_weights(&self) -> bool {
            self.takes_weights
        }

        fn setup(&mut self, weights: Option<Weights>) -> anyhow::Result<()> {
            self.setup_calls.lock().unwrap().push(weights);
            Ok(())
        }

        fn predict(&mut self, args: PredictArgs) -> anyhow::Result<PredictOutput> {
            let s = args.str("s")?;
            if s == "boom" {
                anyhow::bail!("prediction failed");
            }
            if s == "wrong" {
                return Ok(PredictOutput::value(1i64));
            }
            Ok(PredictOutput::value(format!("*{s}*")))
        }
    }

    fn echo(takes_weights: bool) -> (Runner, Arc<Mutex<Vec<Option<Weights>>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let info = PredictorInfo::new("echo", "Predictor", OutputType::single(PrimitiveType::String))
            .input(InputField::new("s", FieldType::required(PrimitiveType::String)));
        let predictor = Echo {
            setup_calls: Arc::clone(&calls),
            takes_weights,
        };
        let runner = Runner::new(LoadedPredictor::new(info, predictor)).unwrap();
        (runner, calls)
    }

    struct Counter;

    impl Predictor for Counter {
        fn setup(&mut self, _weights: Option<Weights>) -> anyhow::Result<()> {
            Ok(())
        }

        fn predict(&mut self, args: PredictArgs) -> anyhow::Result<PredictOutput> {
            let n = args.int("n")?;
            Ok(PredictOutput::stream((0..n).map(|i| {
                let value = if i == 3 {
                    Value::from("three")
                } else {
                    Value::Integer(i)
                };
                Ok::<_, anyhow::Error>(value)
            })))
        }
    }

    fn counter() -> Runner {
        let info = PredictorInfo::new("counter", "Predictor", OutputType::iterator(PrimitiveType::Integer))
            .input(InputField::new("n", FieldType::required(PrimitiveType::Integer)));
        Runner::new(LoadedPredictor::new(info, Counter)).unwrap()
    }

    fn inputs(value: serde_json::Value) -> IndexMap<String, Value> {
        match Value::from(value) {
            Value::Object(map) => map,
            other => panic!("not an object: {other:?}"),
        }
    }

    #[test]
    fn predict_validates_and_returns() {
        let (mut runner, _) = echo(false);
        runner.setup_with(&WeightsSource::default()).unwrap();
        assert!(!runner.is_iter());
        assert_eq!(runner.predict(inputs(json!({"s": "hi"}))).unwrap(), Value::from("*hi*"));
    }

    #[test]
    fn predictor_error_message_is_preserved() {
        let (mut runner, _) = echo(false);
        let err = runner.predict(inputs(json!({"s": "boom"}))).unwrap_err();
        assert!(matches!(err, RunnerError::Predictor(_)));
        assert_eq!(err.to_string(), "prediction failed");
    }

    #[test]
    fn bad_output_is_rejected() {
        let (mut runner, _) = echo(false);
        let err = runner.predict(inputs(json!({"s": "wrong"}))).unwrap_err();
        assert_eq!(err.to_string(), "incompatible output: 1");
    }

    #[test]
    fn setup_without_weights_parameter_gets_none() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("weights")).unwrap();
        let (mut runner, calls) = echo(false);
        runner
            .setup_with(&WeightsSource {
                url: Some("https://example.com/w".into()),
                base_dir: dir.path().into(),
            })
            .unwrap();
        assert_eq!(*calls.lock().unwrap(), vec![None]);
    }

    #[test]
    fn setup_with_weights_parameter_resolves() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("weights")).unwrap();
        let (mut runner, calls) = echo(true);
        runner
            .setup_with(&WeightsSource {
                url: None,
                base_dir: dir.path().into(),
            })
            .unwrap();
        assert_eq!(
            *calls.lock().unwrap(),
            vec![Some(Weights::Path("weights".into()))]
        );
    }

    #[test]
    fn predict_and_predict_iter_preconditions() {
        let (mut single, _) = echo(false);
        assert!(matches!(
            single.predict_iter(inputs(json!({"s": "x"}))),
            Err(RunnerError::Precondition(_))
        ));

        let mut stream = counter();
        assert!(stream.is_iter());
        assert!(matches!(
            stream.predict(inputs(json!({"n": 1}))),
            Err(RunnerError::Precondition(_))
        ));
    }

    #[test]
    fn stream_preserves_order() {
        let mut runner = counter();
        let values: Vec<Value> = runner
            .predict_iter(inputs(json!({"n": 3})))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(values, vec![Value::Integer(0), Value::Integer(1), Value::Integer(2)]);
    }

    #[test]
    fn stream_validates_lazily() {
        let mut runner = counter();
        let mut stream = runner.predict_iter(inputs(json!({"n": 5}))).unwrap();
        for i in 0..3 {
            assert_eq!(stream.next().unwrap().unwrap(), Value::Integer(i));
        }
        let err = stream.next().unwrap().unwrap_err();
        assert_eq!(err.to_string(), "incompatible output: three");
        assert!(stream.next().is_none());
    }

    #[test]
    fn predict_json_buffers_streams() {
        let mut runner = counter();
        let input = json!({"n": 2}).as_object().cloned().unwrap();
        assert_eq!(
            runner.predict_json(input).unwrap(),
            PredictionOutput::Stream(vec![json!(0), json!(1)])
        );

        let input = json!({"n": 4}).as_object().cloned().unwrap();
        assert!(runner.predict_json(input).is_err());
    }

    #[test]
    fn invalid_descriptor_is_a_config_error() {
        let info = PredictorInfo::new(
            "m",
            "P",
            cogless_schema::OutputType {
                kind: cogless_schema::OutputKind::ConcatenateIterator,
                primitive: Some(PrimitiveType::Integer),
                fields: None,
            },
        );
        let err = Runner::new(LoadedPredictor::new(info, Counter)).unwrap_err();
        assert!(matches!(err, RunnerError::Config(_)));
    }
}
