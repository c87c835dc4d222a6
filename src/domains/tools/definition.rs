//! The tool definition record.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use super::handlers::ToolHandler;
use super::schema::InputSchema;

/// A tool as declared by its author: identity, schema and handler.
///
/// Definitions are built once (from a manifest or in code) and never
/// mutated by the registry, which only wraps them.
#[derive(Clone)]
pub struct ToolDefinition {
    /// Short name, unique within one source directory.
    pub name: String,

    /// Human-readable description shown to the calling agent.
    pub description: String,

    pub input_schema: InputSchema,

    pub handler: Arc<dyn ToolHandler>,

    pub category: Option<String>,
    pub subcategory: Option<String>,
    pub version: Option<String>,

    /// Manifest the definition was loaded from, if any.
    pub source: Option<PathBuf>,
}

impl ToolDefinition {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        input_schema: InputSchema,
        handler: Arc<dyn ToolHandler>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
            handler,
            category: None,
            subcategory: None,
            version: None,
            source: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("fields", &self.input_schema.field_names())
            .field("category", &self.category)
            .field("subcategory", &self.subcategory)
            .field("version", &self.version)
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
