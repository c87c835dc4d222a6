//! Tool handlers and the builtin handler catalog.
//!
//! A handler receives arguments that already passed the tool's input schema
//! and produces a `CallToolResult`. Manifests either describe a command to
//! run or name one of the builtin handlers registered here.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use rmcp::model::CallToolResult;
use serde::Deserialize;
use serde_json::Value;

use super::definitions::{CommandSpec, CommandTool, EchoTool, HttpRequestTool};
use super::error::ToolError;
use super::schema::InputSchema;
use crate::core::config::Config;

/// Trait implemented by everything that can serve a tool call.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    /// Run the tool with validated, parsed input.
    async fn call(&self, input: Value) -> Result<CallToolResult, ToolError>;
}

/// The `[handler]` table of a manifest.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum HandlerSpec {
    /// Run an external program.
    Command(CommandSpec),

    /// Use a handler compiled into the server.
    Builtin { id: String },
}

/// A builtin handler together with the parameter schema it expects.
#[derive(Clone)]
pub struct BuiltinEntry {
    pub handler: Arc<dyn ToolHandler>,
    pub input_schema: InputSchema,
}

/// Static registry of builtin handlers, keyed by id.
///
/// The catalog also turns a [`HandlerSpec`] into a callable handler, which
/// is what decides whether a manifest's handler "is callable".
#[derive(Clone)]
pub struct HandlerCatalog {
    config: Arc<Config>,
    builtins: BTreeMap<String, BuiltinEntry>,
}

impl HandlerCatalog {
    /// An empty catalog. Command handlers still resolve.
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            builtins: BTreeMap::new(),
        }
    }

    /// A catalog holding every builtin handler shipped with the server.
    pub fn with_builtins(config: Arc<Config>) -> Self {
        let echo = EchoTool;
        let http = HttpRequestTool::new(&config.execution);

        let mut catalog = Self::new(config);
        catalog.register(EchoTool::ID, Arc::new(echo), EchoTool::input_schema());
        catalog.register(
            HttpRequestTool::ID,
            Arc::new(http),
            HttpRequestTool::input_schema(),
        );
        catalog
    }

    /// Add or replace a builtin handler.
    pub fn register(
        &mut self,
        id: impl Into<String>,
        handler: Arc<dyn ToolHandler>,
        input_schema: InputSchema,
    ) {
        self.builtins.insert(
            id.into(),
            BuiltinEntry {
                handler,
                input_schema,
            },
        );
    }

    /// Look up a builtin by id.
    pub fn builtin(&self, id: &str) -> Option<&BuiltinEntry> {
        self.builtins.get(id)
    }

    /// Ids of all builtin handlers, sorted.
    pub fn builtin_ids(&self) -> Vec<&str> {
        self.builtins.keys().map(String::as_str).collect()
    }

    /// Turn a handler spec into a callable handler.
    ///
    /// The error string explains why the spec is not callable.
    pub fn resolve(&self, spec: &HandlerSpec) -> Result<Arc<dyn ToolHandler>, String> {
        match spec {
            HandlerSpec::Command(command) => {
                if command.program.trim().is_empty() {
                    return Err("command handler has an empty 'program'".to_string());
                }
                Ok(Arc::new(CommandTool::new(command.clone(), self.config.clone())))
            }
            HandlerSpec::Builtin { id } => self
                .builtins
                .get(id)
                .map(|entry| entry.handler.clone())
                .ok_or_else(|| {
                    format!(
                        "unknown builtin handler '{}' (available: {})",
                        id,
                        self.builtin_ids().join(", ")
                    )
                }),
        }
    }
}
