//! Structured-output descriptors.
//!
//! A `Schema` is sent to the model as the response contract and used again locally to
//! check the returned payload before it is deserialized.

use serde_json::{json, Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum Schema {
    String {
        description: Option<&'static str>,
        /// Allowed values; `None` means any string.
        allowed: Option<Vec<&'static str>>,
    },
    Number {
        description: Option<&'static str>,
    },
    Array {
        items: Box<Schema>,
    },
    Object {
        properties: Vec<(&'static str, Schema)>,
        required: Vec<&'static str>,
    },
}

impl Schema {
    pub fn string() -> Self {
        Schema::String {
            description: None,
            allowed: None,
        }
    }

    pub fn string_enum(values: &[&'static str]) -> Self {
        Schema::String {
            description: None,
            allowed: Some(values.to_vec()),
        }
    }

    pub fn number() -> Self {
        Schema::Number { description: None }
    }

    pub fn array_of(items: Schema) -> Self {
        Schema::Array {
            items: Box::new(items),
        }
    }

    pub fn object(properties: Vec<(&'static str, Schema)>, required: &[&'static str]) -> Self {
        Schema::Object {
            properties,
            required: required.to_vec(),
        }
    }

    /// Attaches a description. Ignored for arrays and objects.
    pub fn describe(mut self, text: &'static str) -> Self {
        match &mut self {
            Schema::String { description, .. }
            | Schema::Number { description } => *description = Some(text),
            Schema::Array { .. } | Schema::Object { .. } => {}
        }
        self
    }

    /// Renders the descriptor in the provider's OpenAPI-subset format.
    pub fn to_json(&self) -> Value {
        match self {
            Schema::String {
                description,
                allowed,
            } => {
                let mut out = with_description("STRING", *description);
                if let Some(values) = allowed {
                    out.insert("enum".to_string(), json!(values));
                }
                Value::Object(out)
            }
            Schema::Number { description } => Value::Object(with_description("NUMBER", *description)),
            Schema::Array { items } => json!({ "type": "ARRAY", "items": items.to_json() }),
            Schema::Object {
                properties,
                required,
            } => {
                let props: Map<String, Value> = properties
                    .iter()
                    .map(|(name, schema)| (name.to_string(), schema.to_json()))
                    .collect();
                let mut out = Map::new();
                out.insert("type".to_string(), json!("OBJECT"));
                out.insert("properties".to_string(), Value::Object(props));
                if !required.is_empty() {
                    out.insert("required".to_string(), json!(required));
                }
                Value::Object(out)
            }
        }
    }

    /// Checks that `value` satisfies the descriptor: required fields present, declared
    /// fields correctly typed, enum values in range. Undeclared fields are ignored.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        self.validate_at(value, "$")
    }

    fn validate_at(&self, value: &Value, path: &str) -> Result<(), String> {
        match self {
            Schema::String { allowed, .. } => {
                let s = value
                    .as_str()
                    .ok_or_else(|| type_mismatch(path, "string", value))?;
                if let Some(values) = allowed {
                    if !values.iter().any(|v| *v == s) {
                        return Err(format!(
                            "{path}: '{s}' is not one of [{}]",
                            values.join(", ")
                        ));
                    }
                }
                Ok(())
            }
            Schema::Number { .. } if value.is_number() => Ok(()),
            Schema::Number { .. } => Err(type_mismatch(path, "number", value)),
            Schema::Array { items } => {
                let arr = value
                    .as_array()
                    .ok_or_else(|| type_mismatch(path, "array", value))?;
                for (i, item) in arr.iter().enumerate() {
                    items.validate_at(item, &format!("{path}[{i}]"))?;
                }
                Ok(())
            }
            Schema::Object {
                properties,
                required,
            } => {
                let obj = value
                    .as_object()
                    .ok_or_else(|| type_mismatch(path, "object", value))?;
                for field in required {
                    if obj.get(*field).map_or(true, Value::is_null) {
                        return Err(format!("{path}.{field}: required field is missing"));
                    }
                }
                for (name, schema) in properties {
                    match obj.get(*name) {
                        None | Some(Value::Null) => {}
                        Some(v) => schema.validate_at(v, &format!("{path}.{name}"))?,
                    }
                }
                Ok(())
            }
        }
    }
}

fn with_description(kind: &str, description: Option<&str>) -> Map<String, Value> {
    let mut out = Map::new();
    out.insert("type".to_string(), json!(kind));
    if let Some(text) = description {
        out.insert("description".to_string(), json!(text));
    }
    out
}

fn type_mismatch(path: &str, expected: &str, actual: &Value) -> String {
    let found = match actual {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    format!("{path}: expected {expected}, found {found}")
}
