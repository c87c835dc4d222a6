//! Input schemas for tools.
//!
//! An [`InputSchema`] is a small JSON-Schema subset that tools declare in
//! their manifests (or derive from a Rust type with `schemars`). It can
//! validate raw call arguments into a parsed value and expose its top-level
//! fields as a flat shape for the transport.

use std::collections::BTreeMap;
use std::fmt;

use rmcp::model::JsonObject;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Value types understood by [`InputSchema`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Number,
    Boolean,
    Array,
    Object,
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Array => "array",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}

/// A schema node. The root of a tool schema is usually an object whose
/// `properties` are themselves schema nodes.
///
/// A node without `type` accepts any value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSchema {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<FieldType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Substituted when the field is absent or null.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<Value>>,

    /// Element schema for arrays.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<InputSchema>>,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, InputSchema>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,
}

/// Raw arguments did not satisfy a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", .issues.join("; "))]
pub struct ValidationError {
    /// One `path: problem` entry per violation, in field order.
    pub issues: Vec<String>,
}

impl ValidationError {
    /// A validation error with a single issue.
    pub fn single(issue: impl Into<String>) -> Self {
        Self {
            issues: vec![issue.into()],
        }
    }
}

impl InputSchema {
    /// An object schema with no declared fields.
    pub fn object() -> Self {
        Self {
            kind: Some(FieldType::Object),
            ..Self::default()
        }
    }

    /// A scalar or container schema of the given type.
    pub fn of(kind: FieldType) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    /// Add a field to an object schema.
    pub fn field(mut self, name: impl Into<String>, schema: InputSchema, required: bool) -> Self {
        let name = name.into();
        if required {
            self.required.push(name.clone());
        }
        self.properties.insert(name, schema);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    /// Derive a schema from a Rust parameter type.
    pub fn for_type<T: JsonSchema + 'static>() -> Self {
        let schema = rmcp::handler::server::tool::cached_schema_for_type::<T>();
        Self::from_json_object(&schema)
    }

    /// Convert a JSON Schema document into the supported subset.
    ///
    /// Keywords outside the subset are dropped, which only ever makes the
    /// schema more permissive.
    pub fn from_json_object(schema: &JsonObject) -> Self {
        let kind = match schema.get("type") {
            Some(Value::String(name)) => parse_type(name),
            // `["string", "null"]` is how optional fields come out of schemars.
            Some(Value::Array(names)) => names
                .iter()
                .filter_map(Value::as_str)
                .find_map(parse_type),
            _ => None,
        };

        let properties = schema
            .get("properties")
            .and_then(Value::as_object)
            .map(|props| {
                props
                    .iter()
                    .map(|(name, node)| (name.clone(), Self::from_json_value(node)))
                    .collect()
            })
            .unwrap_or_default();

        let required = schema
            .get("required")
            .and_then(Value::as_array)
            .map(|names| {
                names
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Self {
            kind,
            description: schema
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            default: schema.get("default").cloned(),
            allowed: schema.get("enum").and_then(Value::as_array).cloned(),
            items: schema
                .get("items")
                .map(|items| Box::new(Self::from_json_value(items))),
            properties,
            required,
        }
    }

    fn from_json_value(node: &Value) -> Self {
        match node {
            Value::Object(map) => Self::from_json_object(map),
            // `true` and anything unrecognised accept every value.
            _ => Self::default(),
        }
    }

    /// Whether the root of this schema is an object.
    pub fn is_object(&self) -> bool {
        self.kind == Some(FieldType::Object)
            || (self.kind.is_none() && (!self.properties.is_empty() || !self.required.is_empty()))
    }

    /// Flat mapping of top-level field name to field schema.
    ///
    /// Empty for schemas whose root is not an object.
    pub fn shape(&self) -> BTreeMap<String, InputSchema> {
        if self.is_object() {
            self.properties.clone()
        } else {
            BTreeMap::new()
        }
    }

    /// Top-level field names in sorted order.
    pub fn field_names(&self) -> Vec<String> {
        self.shape().into_keys().collect()
    }

    /// JSON Schema representation handed to MCP clients.
    pub fn to_json_schema(&self) -> JsonObject {
        let mut schema = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        if self.is_object() {
            schema.insert("type".to_string(), Value::String("object".to_string()));
        }
        schema
    }

    /// Validate `raw` and return the parsed value.
    ///
    /// The parsed value differs from the input: undeclared object keys are
    /// dropped, defaults are filled in and numeric or boolean strings are
    /// coerced to the declared type.
    pub fn validate(&self, raw: &Value) -> Result<Value, ValidationError> {
        let mut issues = Vec::new();
        let parsed = self.check(raw, "", &mut issues);
        if issues.is_empty() {
            Ok(parsed)
        } else {
            Err(ValidationError { issues })
        }
    }

    fn check(&self, value: &Value, path: &str, issues: &mut Vec<String>) -> Value {
        let parsed = match (self.kind, value) {
            (_, Value::Object(map)) if self.is_object() => self.check_object(map, path, issues),
            (None, _) if self.is_object() => return mismatch(FieldType::Object, value, path, issues),
            (None, _) => value.clone(),
            (Some(FieldType::String), Value::String(_)) => value.clone(),
            (Some(FieldType::Integer), _) => match coerce_integer(value) {
                Some(number) => Value::Number(number),
                None => return mismatch(FieldType::Integer, value, path, issues),
            },
            (Some(FieldType::Number), _) => match coerce_number(value) {
                Some(number) => Value::Number(number),
                None => return mismatch(FieldType::Number, value, path, issues),
            },
            (Some(FieldType::Boolean), _) => match coerce_bool(value) {
                Some(flag) => Value::Bool(flag),
                None => return mismatch(FieldType::Boolean, value, path, issues),
            },
            (Some(FieldType::Array), Value::Array(elements)) => Value::Array(
                elements
                    .iter()
                    .enumerate()
                    .map(|(index, element)| match &self.items {
                        Some(items) => items.check(element, &format!("{path}[{index}]"), issues),
                        None => element.clone(),
                    })
                    .collect(),
            ),
            (Some(kind), _) => return mismatch(kind, value, path, issues),
        };

        if let Some(allowed) = &self.allowed {
            if !allowed.contains(&parsed) {
                let choices: Vec<String> = allowed.iter().map(Value::to_string).collect();
                issues.push(format!(
                    "{}: expected one of [{}], got {}",
                    display_path(path),
                    choices.join(", "),
                    parsed
                ));
            }
        }

        parsed
    }

    fn check_object(&self, map: &Map<String, Value>, path: &str, issues: &mut Vec<String>) -> Value {
        let field_path = |name: &str| {
            if path.is_empty() {
                name.to_string()
            } else {
                format!("{path}.{name}")
            }
        };

        // Required names without a declared schema accept any non-null value.
        for name in &self.required {
            if !self.properties.contains_key(name)
                && matches!(map.get(name), None | Some(Value::Null))
            {
                issues.push(format!("{}: required field is missing", field_path(name)));
            }
        }

        // Free-form object: nothing declared, nothing stripped.
        if self.properties.is_empty() {
            return Value::Object(map.clone());
        }

        let mut parsed = Map::new();
        for name in &self.required {
            if let Some(value) = map.get(name).filter(|_| !self.properties.contains_key(name)) {
                parsed.insert(name.clone(), value.clone());
            }
        }

        for (name, field) in &self.properties {
            let field_path = field_path(name);

            match map.get(name) {
                None | Some(Value::Null) => {
                    if let Some(default) = &field.default {
                        parsed.insert(name.clone(), default.clone());
                    } else if self.required.contains(name) {
                        issues.push(format!("{field_path}: required field is missing"));
                    }
                }
                Some(value) => {
                    let value = field.check(value, &field_path, issues);
                    parsed.insert(name.clone(), value);
                }
            }
        }
        Value::Object(parsed)
    }
}

fn parse_type(name: &str) -> Option<FieldType> {
    match name {
        "string" => Some(FieldType::String),
        "integer" => Some(FieldType::Integer),
        "number" => Some(FieldType::Number),
        "boolean" => Some(FieldType::Boolean),
        "array" => Some(FieldType::Array),
        "object" => Some(FieldType::Object),
        _ => None,
    }
}

fn coerce_integer(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.clone()),
        Value::Number(n) => n
            .as_f64()
            .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| Number::from(f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok().map(Number::from),
        _ => None,
    }
}

fn coerce_number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => s.trim().parse::<f64>().ok().and_then(Number::from_f64),
        _ => None,
    }
}

fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(s) => match s.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn mismatch(expected: FieldType, value: &Value, path: &str, issues: &mut Vec<String>) -> Value {
    issues.push(format!(
        "{}: expected {}, got {}",
        display_path(path),
        expected,
        kind_of(value)
    ));
    value.clone()
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "input" } else { path }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
