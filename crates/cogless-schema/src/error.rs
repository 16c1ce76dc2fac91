use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("missing schema component: {0}")]
    MissingComponent(String),

    #[error("unsupported type for '{name}': {reason}")]
    UnsupportedType { name: String, reason: String },

    #[error("invalid constraint on input '{param}': {reason}")]
    InvalidConstraint { param: String, reason: String },

    #[error("invalid output type: {0}")]
    InvalidOutput(String),

    #[error("ConcatenateIterator element type must be str, got {0}")]
    ConcatIteratorNotStr(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, SchemaError>;
