//! Tool manifest parsing.
//!
//! A manifest is a TOML document describing one tool. Parsing happens in two
//! steps: the raw document is checked against the tool-shaped predicate,
//! then decoded into a [`ToolDefinition`] with a resolved handler.

use std::path::Path;

use serde::Deserialize;
use toml::Value;

use super::definition::ToolDefinition;
use super::error::LoadError;
use super::handlers::{HandlerCatalog, HandlerSpec};
use super::schema::InputSchema;

/// Typed view of a manifest once it passed the shape check. The handler
/// table is decoded by the shape check itself.
#[derive(Debug, Deserialize)]
struct Manifest {
    name: String,
    description: String,
    input_schema: Value,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    subcategory: Option<String>,
    #[serde(default)]
    version: Option<String>,
}

/// Parse manifest text read from `path`.
pub fn parse_manifest(
    path: &Path,
    text: &str,
    catalog: &HandlerCatalog,
) -> Result<ToolDefinition, LoadError> {
    let document: Value = toml::from_str(text).map_err(|e| LoadError::module_load(path, e))?;

    let spec = check_tool_shape(&document, catalog).map_err(|reason| LoadError::shape(path, reason))?;

    let manifest: Manifest = document
        .try_into()
        .map_err(|e: toml::de::Error| LoadError::shape(path, e.to_string()))?;

    let handler = catalog
        .resolve(&spec)
        .map_err(|reason| LoadError::shape(path, reason))?;

    let mut input_schema: InputSchema = manifest
        .input_schema
        .try_into()
        .map_err(|e: toml::de::Error| LoadError::schema(path, e))?;

    // An empty `[input_schema]` on a builtin adopts the builtin's own schema.
    if let HandlerSpec::Builtin { id } = &spec {
        if input_schema == InputSchema::default() {
            if let Some(entry) = catalog.builtin(id) {
                input_schema = entry.input_schema.clone();
            }
        }
    }

    Ok(ToolDefinition {
        name: manifest.name,
        description: manifest.description,
        input_schema,
        handler,
        category: manifest.category,
        subcategory: manifest.subcategory,
        version: manifest.version,
        source: Some(path.to_path_buf()),
    })
}

/// The tool-shaped predicate.
///
/// Checks, in order: the document is a table, `name` and `description` are
/// strings, `handler` resolves to something callable and `input_schema` is
/// present. Returns the decoded handler spec on success and the first failed
/// check otherwise.
pub fn check_tool_shape(document: &Value, catalog: &HandlerCatalog) -> Result<HandlerSpec, String> {
    let table = document
        .as_table()
        .ok_or_else(|| "document is not a table".to_string())?;

    if !table.get("name").is_some_and(Value::is_str) {
        return Err("'name' must be a string".to_string());
    }
    if !table.get("description").is_some_and(Value::is_str) {
        return Err("'description' must be a string".to_string());
    }

    let handler = table
        .get("handler")
        .ok_or_else(|| "'handler' is missing".to_string())?;
    let spec: HandlerSpec = handler
        .clone()
        .try_into()
        .map_err(|e: toml::de::Error| format!("'handler' is not callable: {}", e.message()))?;
    catalog
        .resolve(&spec)
        .map_err(|reason| format!("'handler' is not callable: {reason}"))?;

    if !table.contains_key("input_schema") {
        return Err("'input_schema' is missing".to_string());
    }

    Ok(spec)
}
