//! Type system for cogless predictor descriptors.
//!
//! A `PredictorInfo` is the declared shape of one predictor: its ordered
//! inputs with their constraints, and the shape of what `predict` returns.
//! These types are plain data; validation against them lives in the `cogless`
//! crate and the OpenAPI rendering lives in [`crate::schema`].

use indexmap::IndexMap;
use serde_json::{Map, Value, json};

use crate::error::{Result, SchemaError};

// ---------------------------------------------------------------------------
// Primitive types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Bool,
    Float,
    Integer,
    String,
    /// Local file path, serialised as `{"type":"string","format":"uri"}`
    Path,
    /// Deprecated alias of Path, same wire format
    File,
    /// Write-only, masked
    Secret,
    /// Opaque value, no type check
    Any,
}

impl PrimitiveType {
    /// JSON Schema fragment for this primitive.
    pub fn json_type(self) -> Value {
        match self {
            Self::Bool => json!({"type": "boolean"}),
            Self::Float => json!({"type": "number"}),
            Self::Integer => json!({"type": "integer"}),
            Self::String => json!({"type": "string"}),
            Self::Path => json!({"type": "string", "format": "uri"}),
            Self::File => json!({"type": "string", "format": "uri"}),
            Self::Secret => json!({
                "type": "string",
                "format": "password",
                "writeOnly": true,
                "x-cog-secret": true
            }),
            Self::Any => json!({"type": "object"}),
        }
    }

    /// Inverse of [`PrimitiveType::json_type`]. `File` reads back as `Path`.
    pub fn from_json_type(schema: &Value) -> Option<Self> {
        let ty = schema.get("type").and_then(Value::as_str)?;
        let format = schema.get("format").and_then(Value::as_str);
        let secret = schema
            .get("x-cog-secret")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        match (ty, format) {
            ("boolean", _) => Some(Self::Bool),
            ("number", _) => Some(Self::Float),
            ("integer", _) => Some(Self::Integer),
            ("string", Some("uri")) => Some(Self::Path),
            ("string", Some("password")) => Some(Self::Secret),
            ("string", _) if secret => Some(Self::Secret),
            ("string", _) => Some(Self::String),
            ("object", _) => Some(Self::Any),
            _ => None,
        }
    }

    /// Short name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Float => "float",
            Self::Integer => "int",
            Self::String => "str",
            Self::Path => "Path",
            Self::File => "File",
            Self::Secret => "Secret",
            Self::Any => "Any",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bool" => Some(Self::Bool),
            "float" => Some(Self::Float),
            "int" => Some(Self::Integer),
            "str" => Some(Self::String),
            "Path" => Some(Self::Path),
            "File" => Some(Self::File),
            "Secret" => Some(Self::Secret),
            "Any" => Some(Self::Any),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Repetition / cardinality
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repetition {
    /// Bare type, `str`
    Required,
    /// `Optional[str]`, accepts null
    Optional,
    /// `list[str]`
    Repeated,
}

// ---------------------------------------------------------------------------
// Field type  (primitive + repetition)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldType {
    pub primitive: PrimitiveType,
    pub repetition: Repetition,
}

impl FieldType {
    pub fn required(primitive: PrimitiveType) -> Self {
        Self {
            primitive,
            repetition: Repetition::Required,
        }
    }

    pub fn optional(primitive: PrimitiveType) -> Self {
        Self {
            primitive,
            repetition: Repetition::Optional,
        }
    }

    pub fn repeated(primitive: PrimitiveType) -> Self {
        Self {
            primitive,
            repetition: Repetition::Repeated,
        }
    }

    pub fn is_list(&self) -> bool {
        self.repetition == Repetition::Repeated
    }

    pub fn json_type(&self) -> Value {
        match self.repetition {
            Repetition::Repeated => {
                json!({
                    "type": "array",
                    "items": self.primitive.json_type()
                })
            }
            _ => self.primitive.json_type(),
        }
    }
}

// ---------------------------------------------------------------------------
// Input field  (one parameter of predict)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct InputField {
    pub name: String,
    /// Position in the predict signature (0-based).
    pub order: usize,
    pub field_type: FieldType,
    /// `None` means no default was declared. `Some(Value::Null)` is a declared
    /// default of none.
    pub default: Option<Value>,
    pub description: Option<String>,
    pub ge: Option<f64>,
    pub le: Option<f64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
    pub regex: Option<String>,
    pub choices: Option<Vec<Value>>,
    pub deprecated: Option<bool>,
}

impl InputField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            order: 0,
            field_type,
            default: None,
            description: None,
            ge: None,
            le: None,
            min_length: None,
            max_length: None,
            regex: None,
            choices: None,
            deprecated: None,
        }
    }

    pub fn default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn ge(mut self, ge: f64) -> Self {
        self.ge = Some(ge);
        self
    }

    pub fn le(mut self, le: f64) -> Self {
        self.le = Some(le);
        self
    }

    pub fn min_length(mut self, n: u64) -> Self {
        self.min_length = Some(n);
        self
    }

    pub fn max_length(mut self, n: u64) -> Self {
        self.max_length = Some(n);
        self
    }

    pub fn regex(mut self, pattern: impl Into<String>) -> Self {
        self.regex = Some(pattern.into());
        self
    }

    pub fn choices(mut self, choices: Vec<Value>) -> Self {
        self.choices = Some(choices);
        self
    }

    /// Is this field required in the schema?
    pub fn is_required(&self) -> bool {
        self.default.is_none()
            && matches!(
                self.field_type.repetition,
                Repetition::Required | Repetition::Repeated
            )
    }

    /// Reject constraints that can never apply to the declared type.
    pub fn check_constraints(&self) -> Result<()> {
        let numeric = matches!(
            self.field_type.primitive,
            PrimitiveType::Integer | PrimitiveType::Float
        );
        if (self.ge.is_some() || self.le.is_some()) && !numeric {
            return Err(SchemaError::InvalidConstraint {
                param: self.name.clone(),
                reason: format!("ge/le require a numeric type, got {}", self.field_type.primitive.name()),
            });
        }
        if let (Some(ge), Some(le)) = (self.ge, self.le)
            && ge > le
        {
            return Err(SchemaError::InvalidConstraint {
                param: self.name.clone(),
                reason: format!("ge {ge} is greater than le {le}"),
            });
        }
        if let (Some(min), Some(max)) = (self.min_length, self.max_length)
            && min > max
        {
            return Err(SchemaError::InvalidConstraint {
                param: self.name.clone(),
                reason: format!("min_length {min} is greater than max_length {max}"),
            });
        }
        if let Some(choices) = &self.choices
            && choices.is_empty()
        {
            return Err(SchemaError::InvalidConstraint {
                param: self.name.clone(),
                reason: "choices must not be empty".into(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Output types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Single,
    List,
    Iterator,
    ConcatenateIterator,
    Object,
}

impl OutputKind {
    /// Streaming kinds are produced incrementally by the predictor.
    pub fn is_iterator(self) -> bool {
        matches!(self, Self::Iterator | Self::ConcatenateIterator)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ObjectField {
    pub field_type: FieldType,
    pub default: Option<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputType {
    pub kind: OutputKind,
    /// Element type for Single/List/Iterator/ConcatIterator.
    pub primitive: Option<PrimitiveType>,
    /// Fields for Object output.
    pub fields: Option<IndexMap<String, ObjectField>>,
}

impl OutputType {
    pub fn single(primitive: PrimitiveType) -> Self {
        Self::element(OutputKind::Single, primitive)
    }

    pub fn list(primitive: PrimitiveType) -> Self {
        Self::element(OutputKind::List, primitive)
    }

    pub fn iterator(primitive: PrimitiveType) -> Self {
        Self::element(OutputKind::Iterator, primitive)
    }

    pub fn concatenate_iterator() -> Self {
        Self::element(OutputKind::ConcatenateIterator, PrimitiveType::String)
    }

    pub fn object<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = (S, FieldType)>,
        S: Into<String>,
    {
        let fields = fields
            .into_iter()
            .map(|(name, field_type)| {
                (
                    name.into(),
                    ObjectField {
                        field_type,
                        default: None,
                    },
                )
            })
            .collect();
        Self {
            kind: OutputKind::Object,
            primitive: None,
            fields: Some(fields),
        }
    }

    fn element(kind: OutputKind, primitive: PrimitiveType) -> Self {
        Self {
            kind,
            primitive: Some(primitive),
            fields: None,
        }
    }

    /// Exactly one of `primitive` / `fields` is populated, matching `kind`.
    pub fn validate(&self) -> Result<()> {
        match (self.kind, &self.primitive, &self.fields) {
            (OutputKind::Object, None, Some(_)) => Ok(()),
            (OutputKind::Object, _, _) => Err(SchemaError::InvalidOutput(
                "object output must declare fields and no element type".into(),
            )),
            (OutputKind::ConcatenateIterator, Some(PrimitiveType::String), None) => Ok(()),
            (OutputKind::ConcatenateIterator, Some(other), None) => {
                Err(SchemaError::ConcatIteratorNotStr(other.name().to_string()))
            }
            (_, Some(_), None) => Ok(()),
            (kind, _, _) => Err(SchemaError::InvalidOutput(format!(
                "{kind:?} output must declare an element type and no fields"
            ))),
        }
    }

    pub fn json_type(&self) -> Value {
        match self.kind {
            OutputKind::Single => {
                let mut v = self.element_json_type();
                if let Value::Object(ref mut m) = v {
                    m.insert("title".into(), json!("Output"));
                }
                v
            }
            OutputKind::List => {
                json!({
                    "title": "Output",
                    "type": "array",
                    "items": self.element_json_type()
                })
            }
            OutputKind::Iterator => {
                json!({
                    "title": "Output",
                    "type": "array",
                    "items": self.element_json_type(),
                    "x-cog-array-type": "iterator"
                })
            }
            OutputKind::ConcatenateIterator => {
                json!({
                    "title": "Output",
                    "type": "array",
                    "items": self.element_json_type(),
                    "x-cog-array-type": "iterator",
                    "x-cog-array-display": "concatenate"
                })
            }
            OutputKind::Object => {
                let fields = match self.fields.as_ref() {
                    Some(f) => f,
                    None => return json!({"title": "Output", "type": "object"}),
                };
                let mut properties = Map::new();
                let mut required = Vec::new();

                for (name, field) in fields {
                    let mut prop = field.field_type.json_type();
                    if let Value::Object(ref mut m) = prop {
                        m.insert("title".into(), json!(title_case(name)));
                        if field.field_type.repetition == Repetition::Optional {
                            m.insert("nullable".into(), json!(true));
                        }
                    }
                    if field.default.is_none()
                        && field.field_type.repetition != Repetition::Optional
                    {
                        required.push(json!(name));
                    }
                    properties.insert(name.clone(), prop);
                }

                let mut schema = json!({
                    "title": "Output",
                    "type": "object",
                    "properties": properties,
                });
                if !required.is_empty()
                    && let Some(obj) = schema.as_object_mut()
                {
                    obj.insert("required".into(), Value::Array(required));
                }
                schema
            }
        }
    }

    fn element_json_type(&self) -> Value {
        self.primitive
            .map(|p| p.json_type())
            .unwrap_or_else(|| json!({"type": "object"}))
    }
}

// ---------------------------------------------------------------------------
// Predictor descriptor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct PredictorInfo {
    pub module_name: String,
    pub class_name: String,
    pub inputs: IndexMap<String, InputField>,
    pub output: OutputType,
}

impl PredictorInfo {
    pub fn new(
        module_name: impl Into<String>,
        class_name: impl Into<String>,
        output: OutputType,
    ) -> Self {
        Self {
            module_name: module_name.into(),
            class_name: class_name.into(),
            inputs: IndexMap::new(),
            output,
        }
    }

    /// Append an input; its order is its position in the declaration.
    pub fn input(mut self, mut field: InputField) -> Self {
        field.order = self.inputs.len();
        self.inputs.insert(field.name.clone(), field);
        self
    }

    /// Streaming predictors yield their output incrementally.
    pub fn is_iterator(&self) -> bool {
        self.output.kind.is_iterator()
    }

    pub fn validate(&self) -> Result<()> {
        for field in self.inputs.values() {
            field.check_constraints()?;
        }
        self.output.validate()
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(crate) fn title_case(s: &str) -> String {
    s.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(c) => c.to_uppercase().to_string() + chars.as_str(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
