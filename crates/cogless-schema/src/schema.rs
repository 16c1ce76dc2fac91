//! OpenAPI 3.0.2 rendering and parsing of `PredictorInfo`.
//!
//! The worker writes this document to `openapi.json` before running setup so
//! the parent can serve it; parsing it back yields the same descriptor.

use indexmap::IndexMap;
use serde_json::{Map, Value, json};

use crate::error::{Result, SchemaError};
use crate::types::*;

/// Shown in place of secret defaults.
pub const REDACTED: &str = "**********";

const SCHEMA_REF_PREFIX: &str = "#/components/schemas/";

/// Generate a complete OpenAPI 3.0.2 specification from predictor info.
pub fn to_json_schema(info: &PredictorInfo) -> Value {
    let (input_schema, enum_schemas) = build_input_schema(info);
    let output_schema = to_json_output(info);

    let mut components: Map<String, Value> = Map::new();
    components.insert("Input".into(), input_schema);
    components.insert("Output".into(), output_schema);

    // Enum schemas (for choices)
    for (name, schema) in enum_schemas {
        components.insert(name, schema);
    }

    components.insert(
        "PredictionRequest".into(),
        json!({
            "title": "PredictionRequest",
            "type": "object",
            "properties": {
                "input": {"$ref": "#/components/schemas/Input"}
            }
        }),
    );

    components.insert(
        "PredictionResponse".into(),
        json!({
            "title": "PredictionResponse",
            "type": "object",
            "properties": {
                "output": {"$ref": "#/components/schemas/Output"},
                "started_at": {"title": "Started At", "type": "string", "format": "date-time"},
                "completed_at": {"title": "Completed At", "type": "string", "format": "date-time"},
                "status": {"$ref": "#/components/schemas/Status"},
                "error": {"title": "Error", "type": "string"}
            }
        }),
    );

    components.insert(
        "Status".into(),
        json!({
            "title": "Status",
            "description": "An enumeration.",
            "enum": ["succeeded", "failed"],
            "type": "string"
        }),
    );

    json!({
        "openapi": "3.0.2",
        "info": {"title": "Cog", "version": "0.1.0"},
        "paths": {
            "/predictions": {
                "post": {
                    "summary": "Predict",
                    "description": "Run a single prediction on the model",
                    "operationId": "predict_predictions_post",
                    "requestBody": {
                        "content": {
                            "application/json": {
                                "schema": {"$ref": "#/components/schemas/PredictionRequest"}
                            }
                        }
                    },
                    "responses": {
                        "200": {
                            "description": "Successful Response",
                            "content": {
                                "application/json": {
                                    "schema": {"$ref": "#/components/schemas/PredictionResponse"}
                                }
                            }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": components
        }
    })
}

/// The `Input` component on its own.
pub fn to_json_input(info: &PredictorInfo) -> Value {
    build_input_schema(info).0
}

/// The `Output` component on its own.
pub fn to_json_output(info: &PredictorInfo) -> Value {
    info.output.json_type()
}

/// Parse a document produced by [`to_json_schema`] back into a descriptor.
pub fn from_json_schema(module_name: &str, class_name: &str, schema: &Value) -> Result<PredictorInfo> {
    Ok(PredictorInfo {
        module_name: module_name.to_string(),
        class_name: class_name.to_string(),
        inputs: from_json_input(schema)?,
        output: from_json_output(schema)?,
    })
}

// ---------------------------------------------------------------------------
// Input schema
// ---------------------------------------------------------------------------

/// Build the Input schema and any enum schemas for choices.
fn build_input_schema(info: &PredictorInfo) -> (Value, Vec<(String, Value)>) {
    let mut properties: Map<String, Value> = Map::new();
    let mut required: Vec<Value> = Vec::new();
    let mut enum_schemas: Vec<(String, Value)> = Vec::new();

    for (name, field) in &info.inputs {
        let mut prop: Map<String, Value> = Map::new();

        prop.insert("x-order".into(), json!(field.order));

        if let Some(ref choices) = field.choices {
            // Choices → $ref to a generated enum schema
            let enum_name = title_case_single(name);
            let enum_type = field.field_type.primitive.json_type();
            let type_str = enum_type
                .get("type")
                .and_then(|v| v.as_str())
                .unwrap_or("string");

            enum_schemas.push((
                enum_name.clone(),
                json!({
                    "title": &enum_name,
                    "description": "An enumeration.",
                    "enum": choices,
                    "type": type_str
                }),
            ));

            let reference = json!([{"$ref": format!("{SCHEMA_REF_PREFIX}{enum_name}")}]);
            if field.field_type.is_list() {
                prop.insert("title".into(), json!(title_case(name)));
                prop.insert("type".into(), json!("array"));
                prop.insert("items".into(), json!({"allOf": reference}));
            } else {
                prop.insert("allOf".into(), reference);
            }
        } else {
            prop.insert("title".into(), json!(title_case(name)));
            if let Value::Object(m) = field.field_type.json_type() {
                prop.extend(m);
            }
        }

        if field.is_required() {
            required.push(json!(name));
        }

        if let Some(ref default) = field.default {
            let default = if field.field_type.primitive == PrimitiveType::Secret {
                redact(default)
            } else {
                default.clone()
            };
            prop.insert("default".into(), default);
        }

        if field.field_type.repetition == Repetition::Optional {
            prop.insert("nullable".into(), json!(true));
        }

        if let Some(ref desc) = field.description {
            prop.insert("description".into(), json!(desc));
        }

        // Numeric constraints
        if let Some(ge) = field.ge {
            prop.insert("minimum".into(), json!(ge));
        }
        if let Some(le) = field.le {
            prop.insert("maximum".into(), json!(le));
        }

        // String constraints
        if let Some(min_len) = field.min_length {
            prop.insert("minLength".into(), json!(min_len));
        }
        if let Some(max_len) = field.max_length {
            prop.insert("maxLength".into(), json!(max_len));
        }
        if let Some(ref regex) = field.regex {
            prop.insert("pattern".into(), json!(regex));
        }

        if field.deprecated == Some(true) {
            prop.insert("deprecated".into(), json!(true));
        }

        properties.insert(name.clone(), Value::Object(prop));
    }

    let mut input_schema = json!({
        "title": "Input",
        "type": "object",
        "properties": properties,
    });

    if !required.is_empty()
        && let Some(obj) = input_schema.as_object_mut()
    {
        obj.insert("required".into(), Value::Array(required));
    }

    (input_schema, enum_schemas)
}

fn redact(default: &Value) -> Value {
    match default {
        Value::String(_) => json!(REDACTED),
        Value::Array(items) => Value::Array(items.iter().map(redact).collect()),
        other => other.clone(),
    }
}

/// Parse the `Input` component back into ordered input fields.
pub fn from_json_input(schema: &Value) -> Result<IndexMap<String, InputField>> {
    let components = components(schema)?;
    let input = components
        .get("Input")
        .ok_or_else(|| SchemaError::MissingComponent("Input".into()))?;

    let properties = input
        .get("properties")
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    let mut fields: Vec<InputField> = Vec::with_capacity(properties.len());
    for (name, prop) in &properties {
        fields.push(parse_input_field(name, prop, components)?);
    }
    fields.sort_by_key(|f| f.order);

    Ok(fields.into_iter().map(|f| (f.name.clone(), f)).collect())
}

fn parse_input_field(name: &str, prop: &Value, components: &Map<String, Value>) -> Result<InputField> {
    let unsupported = |reason: &str| SchemaError::UnsupportedType {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let is_array = prop.get("type").and_then(Value::as_str) == Some("array");
    let element = if is_array {
        prop.get("items").ok_or_else(|| unsupported("array without items"))?
    } else {
        prop
    };

    let (primitive, choices) = match enum_ref(element) {
        Some(enum_name) => {
            let enum_schema = components
                .get(enum_name)
                .ok_or_else(|| SchemaError::MissingComponent(enum_name.to_string()))?;
            let primitive = PrimitiveType::from_json_type(enum_schema)
                .ok_or_else(|| unsupported("enum without a primitive type"))?;
            let choices = enum_schema
                .get("enum")
                .and_then(Value::as_array)
                .cloned()
                .ok_or_else(|| unsupported("enum without values"))?;
            (primitive, Some(choices))
        }
        None => {
            let primitive =
                PrimitiveType::from_json_type(element).ok_or_else(|| unsupported("unknown JSON type"))?;
            (primitive, None)
        }
    };

    let nullable = prop.get("nullable").and_then(Value::as_bool).unwrap_or(false);
    let repetition = if is_array {
        Repetition::Repeated
    } else if nullable {
        Repetition::Optional
    } else {
        Repetition::Required
    };

    Ok(InputField {
        name: name.to_string(),
        order: prop
            .get("x-order")
            .and_then(Value::as_u64)
            .map(|n| n as usize)
            .unwrap_or(0),
        field_type: FieldType {
            primitive,
            repetition,
        },
        default: prop.get("default").cloned(),
        description: prop
            .get("description")
            .and_then(Value::as_str)
            .map(String::from),
        ge: prop.get("minimum").and_then(Value::as_f64),
        le: prop.get("maximum").and_then(Value::as_f64),
        min_length: prop.get("minLength").and_then(Value::as_u64),
        max_length: prop.get("maxLength").and_then(Value::as_u64),
        regex: prop.get("pattern").and_then(Value::as_str).map(String::from),
        choices,
        deprecated: prop.get("deprecated").and_then(Value::as_bool),
    })
}

/// `{"allOf": [{"$ref": "#/components/schemas/Foo"}]}` → `Foo`
fn enum_ref(prop: &Value) -> Option<&str> {
    prop.get("allOf")?
        .as_array()?
        .first()?
        .get("$ref")?
        .as_str()?
        .strip_prefix(SCHEMA_REF_PREFIX)
}

// ---------------------------------------------------------------------------
// Output schema
// ---------------------------------------------------------------------------

/// Parse the `Output` component back into an output type.
pub fn from_json_output(schema: &Value) -> Result<OutputType> {
    let output = components(schema)?
        .get("Output")
        .ok_or_else(|| SchemaError::MissingComponent("Output".into()))?;
    let unknown = || SchemaError::InvalidOutput(format!("unrecognised output schema: {output}"));

    match output.get("type").and_then(Value::as_str) {
        Some("array") => {
            let items = output.get("items").ok_or_else(unknown)?;
            let primitive = PrimitiveType::from_json_type(items).ok_or_else(unknown)?;
            let iterator = output.get("x-cog-array-type").and_then(Value::as_str) == Some("iterator");
            let concatenate =
                output.get("x-cog-array-display").and_then(Value::as_str) == Some("concatenate");
            Ok(match (iterator, concatenate) {
                (true, true) => OutputType {
                    kind: OutputKind::ConcatenateIterator,
                    primitive: Some(primitive),
                    fields: None,
                },
                (true, false) => OutputType::iterator(primitive),
                _ => OutputType::list(primitive),
            })
        }
        Some("object") if output.get("properties").is_some() => {
            let properties = output
                .get("properties")
                .and_then(Value::as_object)
                .ok_or_else(unknown)?;
            let required: Vec<&str> = output
                .get("required")
                .and_then(Value::as_array)
                .map(|r| r.iter().filter_map(Value::as_str).collect())
                .unwrap_or_default();

            let mut fields = IndexMap::new();
            for (name, prop) in properties {
                let is_array = prop.get("type").and_then(Value::as_str) == Some("array");
                let element = if is_array {
                    prop.get("items").ok_or_else(unknown)?
                } else {
                    prop
                };
                let primitive = PrimitiveType::from_json_type(element).ok_or_else(unknown)?;
                let nullable = prop.get("nullable").and_then(Value::as_bool).unwrap_or(false);
                let repetition = if is_array {
                    Repetition::Repeated
                } else if nullable {
                    Repetition::Optional
                } else {
                    Repetition::Required
                };
                // Not required and not nullable means the model declared a default.
                let default = if required.contains(&name.as_str()) || nullable {
                    None
                } else {
                    Some(Value::Null)
                };
                fields.insert(
                    name.clone(),
                    ObjectField {
                        field_type: FieldType {
                            primitive,
                            repetition,
                        },
                        default,
                    },
                );
            }
            Ok(OutputType {
                kind: OutputKind::Object,
                primitive: None,
                fields: Some(fields),
            })
        }
        Some(_) => {
            let primitive = PrimitiveType::from_json_type(output).ok_or_else(unknown)?;
            Ok(OutputType::single(primitive))
        }
        None => Err(unknown()),
    }
}

fn components(schema: &Value) -> Result<&Map<String, Value>> {
    schema
        .get("components")
        .and_then(|c| c.get("schemas"))
        .and_then(Value::as_object)
        .ok_or_else(|| SchemaError::MissingComponent("components.schemas".into()))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Title case a single identifier: `color` → `Color`
fn title_case_single(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(c) => c.to_uppercase().to_string() + chars.as_str(),
    }
}
