//! Validation against the JSON Schema subset used for event schemas.
//!
//! Supported keywords: `type` (single or list), `properties`, `required`,
//! `additionalProperties: false`, `items`, `enum`, and local `$ref`s of the
//! form `#/...` (so schemas generated as `{"$ref": "#/$defs/Event"}` work).
//! Unknown keywords are ignored, as JSON Schema prescribes.

use serde_json::{Map, Value};
use std::fmt;

/// Upper bound on `$ref` hops while resolving a single node.
const MAX_REF_DEPTH: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// JSON pointer to the offending value, `""` for the root.
    pub path: String,
    pub message: String,
}

impl ValidationError {
    fn new(path: &str, message: impl Into<String>) -> Self {
        Self {
            path: path.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

/// A parsed schema document.
#[derive(Debug, Clone)]
pub struct JsonSchema {
    root: Value,
}

impl JsonSchema {
    /// Parse a schema document. The root must be an object or a boolean.
    pub fn parse(schema: &str) -> Result<Self, String> {
        let root: Value = serde_json::from_str(schema).map_err(|e| e.to_string())?;
        match root {
            Value::Object(_) | Value::Bool(_) => Ok(Self { root }),
            other => Err(format!("schema root must be an object, got {other}")),
        }
    }

    pub fn validate(&self, value: &Value) -> Result<(), ValidationError> {
        self.validate_node(&self.root, value, "")
    }

    fn resolve<'a>(
        &'a self,
        mut node: &'a Value,
        path: &str,
    ) -> Result<&'a Value, ValidationError> {
        for _ in 0..MAX_REF_DEPTH {
            let Some(reference) = node.get("$ref").and_then(Value::as_str) else {
                return Ok(node);
            };
            let pointer = reference.strip_prefix('#').ok_or_else(|| {
                ValidationError::new(path, format!("unsupported non-local $ref '{reference}'"))
            })?;
            node = self.root.pointer(pointer).ok_or_else(|| {
                ValidationError::new(path, format!("unresolvable $ref '{reference}'"))
            })?;
        }
        Err(ValidationError::new(path, "$ref chain too deep"))
    }

    fn validate_node(
        &self,
        node: &Value,
        value: &Value,
        path: &str,
    ) -> Result<(), ValidationError> {
        let node = self.resolve(node, path)?;
        let schema = match node {
            Value::Bool(true) => return Ok(()),
            Value::Bool(false) => return Err(ValidationError::new(path, "no value is allowed")),
            Value::Object(schema) => schema,
            _ => return Err(ValidationError::new(path, "schema node must be an object")),
        };

        if let Some(expected) = schema.get("type") {
            check_type(expected, value, path)?;
        }

        if let Some(Value::Array(allowed)) = schema.get("enum") {
            if !allowed.contains(value) {
                return Err(ValidationError::new(
                    path,
                    format!("{value} is not one of {allowed:?}"),
                ));
            }
        }

        if let Value::Object(object) = value {
            self.validate_object(schema, object, path)?;
        }

        if let (Value::Array(elements), Some(items)) = (value, schema.get("items")) {
            for (i, element) in elements.iter().enumerate() {
                self.validate_node(items, element, &format!("{path}/{i}"))?;
            }
        }

        Ok(())
    }

    fn validate_object(
        &self,
        schema: &Map<String, Value>,
        object: &Map<String, Value>,
        path: &str,
    ) -> Result<(), ValidationError> {
        if let Some(Value::Array(required)) = schema.get("required") {
            for name in required.iter().filter_map(Value::as_str) {
                if !object.contains_key(name) {
                    return Err(ValidationError::new(
                        path,
                        format!("missing required property '{name}'"),
                    ));
                }
            }
        }

        let properties = schema.get("properties").and_then(Value::as_object);
        let closed = matches!(schema.get("additionalProperties"), Some(Value::Bool(false)));

        for (name, field) in object {
            let field_path = format!("{path}/{name}");
            match properties.and_then(|p| p.get(name)) {
                Some(field_schema) => self.validate_node(field_schema, field, &field_path)?,
                None if closed => {
                    return Err(ValidationError::new(
                        path,
                        format!("additional property '{name}' is not allowed"),
                    ));
                }
                None => {}
            }
        }

        Ok(())
    }
}

fn check_type(expected: &Value, value: &Value, path: &str) -> Result<(), ValidationError> {
    let allowed: Vec<&str> = match expected {
        Value::String(name) => vec![name.as_str()],
        Value::Array(names) => names.iter().filter_map(Value::as_str).collect(),
        _ => return Err(ValidationError::new(path, "'type' must be a string or list")),
    };
    if allowed.iter().any(|name| type_matches(name, value)) {
        Ok(())
    } else {
        Err(ValidationError::new(
            path,
            format!("expected {}, got {}", allowed.join(" or "), type_name(value)),
        ))
    }
}

fn type_matches(name: &str, value: &Value) -> bool {
    match name {
        "object" => value.is_object(),
        "array" => value.is_array(),
        "string" => value.is_string(),
        "boolean" => value.is_boolean(),
        "null" => value.is_null(),
        "number" => value.is_number(),
        "integer" => {
            value.is_i64()
                || value.is_u64()
                || value.as_f64().is_some_and(|f| f.fract() == 0.0)
        }
        _ => false,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
