//! Argument construction: type check, normalize, fill defaults, enforce
//! constraints.
//!
//! Every request input is checked against its declared [`InputField`] before
//! the predictor sees it. Errors carry the messages the parent shows to users
//! (`incompatible input for: s`, `not all values >= 1 for: n`, ...).

use std::collections::HashMap;

use indexmap::IndexMap;
use jsonschema::error::ValidationErrorKind;
use serde_json::{Map, json};

use cogless_schema::{InputField, PredictorInfo, PrimitiveType, Repetition};

use crate::predictor::PredictArgs;
use crate::runner::RunnerError;
use crate::value::{Secret, Value};

/// Compiled input checks for one predictor.
pub struct InputValidator {
    inputs: IndexMap<String, InputField>,
    /// Per-element constraint schemas compiled once, keyed by input name.
    constraints: HashMap<String, jsonschema::Validator>,
}

impl InputValidator {
    /// Compile the constraints of every input into a JSON Schema validator
    /// applied to each element.
    ///
    /// Patterns are anchored at the start only, so `a+` accepts `aab` but not
    /// `baa`.
    pub fn new(info: &PredictorInfo) -> Result<Self, RunnerError> {
        let mut constraints = HashMap::new();
        for field in info.inputs.values() {
            let Some(schema) = element_schema(field) else {
                continue;
            };
            let validator = jsonschema::validator_for(&schema).map_err(|e| {
                RunnerError::Config(format!("invalid constraints for {}: {e}", field.name))
            })?;
            constraints.insert(field.name.clone(), validator);
        }

        Ok(Self {
            inputs: info.inputs.clone(),
            constraints,
        })
    }

    /// Build the predictor's keyword arguments from request inputs.
    pub fn build_args(&self, mut inputs: IndexMap<String, Value>) -> Result<PredictArgs, RunnerError> {
        // Reject unknown names first so a typo is reported as such, not as a
        // missing required input.
        if let Some(name) = inputs.keys().find(|name| !self.inputs.contains_key(*name)) {
            return Err(RunnerError::Validation(format!("unknown input: {name}")));
        }

        let mut args = IndexMap::with_capacity(self.inputs.len());
        for (name, field) in &self.inputs {
            let value = match inputs.shift_remove(name) {
                Some(value) => check_and_normalize(field, value)?,
                None => match &field.default {
                    Some(serde_json::Value::Null) => Value::Null,
                    Some(default) => check_and_normalize(field, Value::from(default.clone()))?,
                    None => return Err(RunnerError::MissingDefault(name.clone())),
                },
            };
            self.check_constraints(field, &value)?;
            args.insert(name.clone(), value);
        }

        Ok(PredictArgs::new(args))
    }

    fn check_constraints(&self, field: &InputField, value: &Value) -> Result<(), RunnerError> {
        let Some(validator) = self.constraints.get(&field.name) else {
            return Ok(());
        };
        // Sequence inputs are checked per element; anything else is one element.
        let elements: Vec<&Value> = match (field.field_type.repetition, value) {
            (_, Value::Null) => Vec::new(),
            (Repetition::Repeated, Value::List(items)) => items.iter().collect(),
            (_, single) => vec![single],
        };

        let first = elements
            .iter()
            .map(|v| constraint_instance(v))
            .flat_map(|instance| {
                validator
                    .iter_errors(&instance)
                    .map(|error| violation(field, error.kind()))
                    .collect::<Vec<_>>()
            })
            .min_by_key(|(rank, _)| *rank);
        match first {
            Some((_, msg)) => Err(RunnerError::Validation(msg)),
            None => Ok(()),
        }
    }
}

/// JSON Schema for one element of `field`, or `None` when it has no
/// constraints.
fn element_schema(field: &InputField) -> Option<serde_json::Value> {
    let mut schema = Map::new();
    if let Some(ge) = field.ge {
        schema.insert("minimum".into(), json!(ge));
    }
    if let Some(le) = field.le {
        schema.insert("maximum".into(), json!(le));
    }
    // Lengths apply to strings and, for `Any` inputs, to arrays.
    if let Some(min) = field.min_length {
        schema.insert("minLength".into(), json!(min));
        schema.insert("minItems".into(), json!(min));
    }
    if let Some(max) = field.max_length {
        schema.insert("maxLength".into(), json!(max));
        schema.insert("maxItems".into(), json!(max));
    }
    if let Some(regex) = field.regex.as_deref() {
        schema.insert("pattern".into(), json!(format!("^(?:{regex})")));
    }
    if let Some(choices) = &field.choices {
        let choices: Vec<serde_json::Value> = match field.field_type.primitive {
            // Float inputs are normalized to floats, so compare against floats.
            PrimitiveType::Float => choices
                .iter()
                .map(|c| c.as_f64().map_or_else(|| c.clone(), |f| json!(f)))
                .collect(),
            _ => choices.clone(),
        };
        schema.insert("enum".into(), serde_json::Value::Array(choices));
    }
    (!schema.is_empty()).then_some(serde_json::Value::Object(schema))
}

/// The JSON a constraint sees: paths as their string, secrets exposed.
fn constraint_instance(value: &Value) -> serde_json::Value {
    match value {
        Value::Path(p) => json!(p.to_string_lossy()),
        Value::Secret(s) => json!(s.expose()),
        other => other.to_json(),
    }
}

/// Message for a failed constraint, ranked so the reported violation does not
/// depend on validator ordering.
fn violation(field: &InputField, kind: &ValidationErrorKind) -> (u8, String) {
    let name = &field.name;
    match kind {
        ValidationErrorKind::Minimum { .. } => {
            (0, format!("not all values >= {} for: {name}", field.ge.unwrap_or_default()))
        }
        ValidationErrorKind::Maximum { .. } => {
            (1, format!("not all values <= {} for: {name}", field.le.unwrap_or_default()))
        }
        ValidationErrorKind::MinLength { .. } | ValidationErrorKind::MinItems { .. } => (
            2,
            format!(
                "not all values have len(x) >= {} for: {name}",
                field.min_length.unwrap_or_default()
            ),
        ),
        ValidationErrorKind::MaxLength { .. } | ValidationErrorKind::MaxItems { .. } => (
            3,
            format!(
                "not all values have len(x) <= {} for: {name}",
                field.max_length.unwrap_or_default()
            ),
        ),
        ValidationErrorKind::Pattern { .. } => (4, format!("not all inputs match regex for: {name}")),
        ValidationErrorKind::Enum { .. } => (5, format!("not all inputs in choices for: {name}")),
        _ => (6, format!("invalid input for: {name}")),
    }
}

/// Type check a value against its declared field and normalize it.
///
/// Sequence inputs must be lists; each element is checked on its own.
/// Normalizing an already normalized value returns it unchanged.
pub fn check_and_normalize(field: &InputField, value: Value) -> Result<Value, RunnerError> {
    let primitive = field.field_type.primitive;
    let normalized = match (field.field_type.repetition, value) {
        (Repetition::Repeated, Value::List(items)) => items
            .into_iter()
            .map(|item| normalize_element(primitive, item))
            .collect::<Option<Vec<_>>>()
            .map(Value::List),
        (Repetition::Repeated, _) => None,
        (Repetition::Optional, Value::Null) => Some(Value::Null),
        (_, value) => normalize_element(primitive, value),
    };
    normalized.ok_or_else(|| RunnerError::Validation(format!("incompatible input for: {}", field.name)))
}

fn normalize_element(primitive: PrimitiveType, value: Value) -> Option<Value> {
    match (primitive, value) {
        (PrimitiveType::Any, v) => Some(v),
        (PrimitiveType::Bool, v @ Value::Bool(_)) => Some(v),
        (PrimitiveType::Integer, v @ Value::Integer(_)) => Some(v),
        (PrimitiveType::Float, v @ Value::Float(_)) => Some(v),
        (PrimitiveType::Float, Value::Integer(n)) => Some(Value::Float(n as f64)),
        (PrimitiveType::String, v @ Value::String(_)) => Some(v),
        (PrimitiveType::Path | PrimitiveType::File, v @ Value::Path(_)) => Some(v),
        (PrimitiveType::Path | PrimitiveType::File, Value::String(s)) => Some(Value::Path(s.into())),
        (PrimitiveType::Secret, v @ Value::Secret(_)) => Some(v),
        (PrimitiveType::Secret, Value::String(s)) => Some(Value::Secret(Secret::new(s))),
        _ => None,
    }
}
