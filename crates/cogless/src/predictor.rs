//! Predictor capability interface.

use std::path::{Path, PathBuf};

use indexmap::IndexMap;

use cogless_schema::PredictorInfo;

use crate::value::{Secret, Value};

/// Lazily produced output elements of a streaming predictor.
pub type ValueStream = Box<dyn Iterator<Item = anyhow::Result<Value>> + Send>;

/// What `Predictor::predict` hands back.
pub enum PredictOutput {
    Value(Value),
    Stream(ValueStream),
}

impl std::fmt::Debug for PredictOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

impl PredictOutput {
    pub fn value(value: impl Into<Value>) -> Self {
        Self::Value(value.into())
    }

    pub fn stream<I>(items: I) -> Self
    where
        I: IntoIterator<Item = anyhow::Result<Value>>,
        I::IntoIter: Send + 'static,
    {
        Self::Stream(Box::new(items.into_iter()))
    }
}

/// Weights handed to `setup` when the predictor takes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Weights {
    Url(String),
    Path(PathBuf),
}

/// A loaded predictor.
///
/// `setup` runs once before any prediction. `predict` receives arguments that
/// have already been type checked, normalized and constraint checked.
pub trait Predictor: Send {
    /// Whether `setup` takes a weights argument.
    fn setup_weights(&self) -> bool {
        false
    }

    fn setup(&mut self, weights: Option<Weights>) -> anyhow::Result<()>;

    fn predict(&mut self, args: PredictArgs) -> anyhow::Result<PredictOutput>;
}

/// A predictor instance together with its declared shape.
pub struct LoadedPredictor {
    pub info: PredictorInfo,
    pub predictor: Box<dyn Predictor>,
}

impl std::fmt::Debug for LoadedPredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadedPredictor")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}

impl LoadedPredictor {
    pub fn new(info: PredictorInfo, predictor: impl Predictor + 'static) -> Self {
        Self {
            info,
            predictor: Box::new(predictor),
        }
    }
}

/// Validated keyword arguments in declared parameter order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictArgs(IndexMap<String, Value>);

impl PredictArgs {
    pub fn new(args: IndexMap<String, Value>) -> Self {
        Self(args)
    }

    pub fn get(&self, name: &str) -> anyhow::Result<&Value> {
        self.0
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("missing argument: {name}"))
    }

    pub fn str(&self, name: &str) -> anyhow::Result<&str> {
        let value = self.get(name)?;
        value
            .as_str()
            .ok_or_else(|| anyhow::anyhow!("argument {name} is not a string: {value}"))
    }

    pub fn int(&self, name: &str) -> anyhow::Result<i64> {
        let value = self.get(name)?;
        value
            .as_i64()
            .ok_or_else(|| anyhow::anyhow!("argument {name} is not an integer: {value}"))
    }

    pub fn float(&self, name: &str) -> anyhow::Result<f64> {
        let value = self.get(name)?;
        value
            .as_f64()
            .ok_or_else(|| anyhow::anyhow!("argument {name} is not a number: {value}"))
    }

    pub fn bool(&self, name: &str) -> anyhow::Result<bool> {
        let value = self.get(name)?;
        value
            .as_bool()
            .ok_or_else(|| anyhow::anyhow!("argument {name} is not a bool: {value}"))
    }

    pub fn path(&self, name: &str) -> anyhow::Result<&Path> {
        let value = self.get(name)?;
        value
            .as_path()
            .ok_or_else(|| anyhow::anyhow!("argument {name} is not a path: {value}"))
    }

    pub fn secret(&self, name: &str) -> anyhow::Result<&Secret> {
        let value = self.get(name)?;
        value
            .as_secret()
            .ok_or_else(|| anyhow::anyhow!("argument {name} is not a secret"))
    }

    pub fn list(&self, name: &str) -> anyhow::Result<&[Value]> {
        let value = self.get(name)?;
        value
            .as_list()
            .ok_or_else(|| anyhow::anyhow!("argument {name} is not a list: {value}"))
    }

    #[cfg(test)]
    pub(crate) fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}
