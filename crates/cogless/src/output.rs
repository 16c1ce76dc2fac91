//! Output validation against the declared output type.

use cogless_schema::{FieldType, OutputKind, OutputType, PrimitiveType, Repetition};

use crate::runner::RunnerError;
use crate::value::Value;

/// Does a single element match the declared primitive?
///
/// `Float` accepts integers and `Any` accepts everything.
pub fn check_value(primitive: PrimitiveType, value: &Value) -> bool {
    match primitive {
        PrimitiveType::Any => true,
        PrimitiveType::Bool => matches!(value, Value::Bool(_)),
        PrimitiveType::Integer => matches!(value, Value::Integer(_)),
        PrimitiveType::Float => matches!(value, Value::Float(_) | Value::Integer(_)),
        PrimitiveType::String => matches!(value, Value::String(_)),
        PrimitiveType::Path | PrimitiveType::File => matches!(value, Value::Path(_)),
        PrimitiveType::Secret => matches!(value, Value::Secret(_)),
    }
}

fn check_field(field_type: FieldType, value: &Value) -> bool {
    match (field_type.repetition, value) {
        (Repetition::Optional, Value::Null) => true,
        (Repetition::Repeated, Value::List(items)) => {
            items.iter().all(|v| check_value(field_type.primitive, v))
        }
        (Repetition::Repeated, _) => false,
        (_, v) => check_value(field_type.primitive, v),
    }
}

fn incompatible(value: &Value) -> RunnerError {
    RunnerError::Validation(format!("incompatible output: {value}"))
}

/// Validate the complete output of a single-call predictor.
pub fn check_output(output: &OutputType, value: &Value) -> Result<(), RunnerError> {
    match output.kind {
        OutputKind::Single => {
            let primitive = element_type(output)?;
            if !check_value(primitive, value) {
                return Err(incompatible(value));
            }
        }
        OutputKind::List => {
            let primitive = element_type(output)?;
            let Value::List(items) = value else {
                return Err(RunnerError::Validation("output is not list".into()));
            };
            if let Some(bad) = items.iter().find(|v| !check_value(primitive, v)) {
                return Err(incompatible(bad));
            }
        }
        OutputKind::Object => {
            let fields = output
                .fields
                .as_ref()
                .ok_or_else(|| RunnerError::Config("missing output fields".into()))?;
            let Value::Object(returned) = value else {
                return Err(incompatible(value));
            };
            for (name, field) in fields {
                let field_value = returned
                    .get(name)
                    .ok_or_else(|| RunnerError::Validation(format!("missing output field: {name}")))?;
                if !check_field(field.field_type, field_value) {
                    return Err(RunnerError::Validation(format!(
                        "incompatible output: {name}={field_value}"
                    )));
                }
            }
        }
        // Streams are checked per element as they are consumed.
        OutputKind::Iterator | OutputKind::ConcatenateIterator => {
            let primitive = element_type(output)?;
            if !check_value(primitive, value) {
                return Err(incompatible(value));
            }
        }
    }
    Ok(())
}

/// Validate one element of a streaming predictor's output.
pub fn check_element(primitive: PrimitiveType, value: &Value) -> Result<(), RunnerError> {
    if check_value(primitive, value) {
        Ok(())
    } else {
        Err(incompatible(value))
    }
}

pub(crate) fn element_type(output: &OutputType) -> Result<PrimitiveType, RunnerError> {
    output
        .primitive
        .ok_or_else(|| RunnerError::Config("missing output type".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use std::path::PathBuf;

    #[test]
    fn single_value() {
        let out = OutputType::single(PrimitiveType::String);
        assert!(check_output(&out, &Value::from("ok")).is_ok());
        let err = check_output(&out, &Value::Integer(1)).unwrap_err();
        assert_eq!(err.to_string(), "incompatible output: 1");
    }

    #[test]
    fn float_accepts_integer() {
        let out = OutputType::single(PrimitiveType::Float);
        assert!(check_output(&out, &Value::Integer(3)).is_ok());
        assert!(check_output(&out, &Value::from("3")).is_err());
    }

    #[test]
    fn list_requires_list() {
        let out = OutputType::list(PrimitiveType::Path);
        let err = check_output(&out, &Value::Path(PathBuf::from("a"))).unwrap_err();
        assert_eq!(err.to_string(), "output is not list");

        let mixed = Value::List(vec![Value::Path(PathBuf::from("a")), Value::from("b")]);
        assert_eq!(
            check_output(&out, &mixed).unwrap_err().to_string(),
            "incompatible output: b"
        );
    }

    #[test]
    fn object_fields() {
        let out = OutputType::object([
            ("text", FieldType::required(PrimitiveType::String)),
            ("score", FieldType::optional(PrimitiveType::Float)),
        ]);

        let mut fields = IndexMap::new();
        fields.insert("text".to_string(), Value::from("hi"));
        fields.insert("score".to_string(), Value::Null);
        assert!(check_output(&out, &Value::Object(fields.clone())).is_ok());

        fields.shift_remove("score");
        assert_eq!(
            check_output(&out, &Value::Object(fields.clone())).unwrap_err().to_string(),
            "missing output field: score"
        );

        fields.insert("score".to_string(), Value::from("high"));
        assert_eq!(
            check_output(&out, &Value::Object(fields)).unwrap_err().to_string(),
            "incompatible output: score=high"
        );
    }

    #[test]
    fn any_accepts_everything() {
        let out = OutputType::single(PrimitiveType::Any);
        assert!(check_output(&out, &Value::Null).is_ok());
        assert!(check_output(&out, &Value::List(vec![])).is_ok());
    }
}
