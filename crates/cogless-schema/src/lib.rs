//! Declared shapes of cogless predictors.
//!
//! [`PredictorInfo`] describes a predictor's inputs and output. The
//! [`schema`] module renders it as the OpenAPI document the worker publishes
//! in `openapi.json`, and parses that document back.

pub mod error;
pub mod schema;
pub mod types;

pub use crate::error::{Result, SchemaError};
pub use crate::schema::{
    REDACTED, from_json_input, from_json_output, from_json_schema, to_json_input, to_json_output,
    to_json_schema,
};
pub use crate::types::{
    FieldType, InputField, ObjectField, OutputKind, OutputType, PredictorInfo, PrimitiveType,
    Repetition,
};
