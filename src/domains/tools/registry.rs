//! Tool Registry - namespaced, validated tool registration.
//!
//! A registry owns the tools loaded from one source directory. Every tool
//! is stored under its qualified name (`prefix` + `_` + name) and wrapped
//! so that calls are validated against the tool's input schema before the
//! handler runs.

use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::FutureExt;
use rmcp::model::{CallToolResult, JsonObject, Tool};
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use super::definition::ToolDefinition;
use super::error::{LoadError, ToolError};
use super::handlers::HandlerCatalog;
use super::loader::{Discovered, discover};
use super::schema::InputSchema;

// ============================================================================
// Naming
// ============================================================================

/// Build the externally visible name of a tool.
///
/// An empty prefix leaves the name unchanged. Otherwise the prefix and name
/// are joined with a single `_`, whether or not the prefix already ends
/// with one: `("docker", "ps")` and `("docker_", "ps")` both give
/// `docker_ps`.
pub fn qualified_name(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else if prefix.ends_with('_') {
        format!("{prefix}{name}")
    } else {
        format!("{prefix}_{name}")
    }
}

// ============================================================================
// Registered Tool
// ============================================================================

/// A tool definition wrapped with its qualified name.
#[derive(Debug, Clone)]
pub struct RegisteredTool {
    qualified_name: String,
    definition: Arc<ToolDefinition>,
}

impl RegisteredTool {
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub fn definition(&self) -> &ToolDefinition {
        &self.definition
    }

    /// Flat field mapping of the input schema.
    pub fn shape(&self) -> BTreeMap<String, InputSchema> {
        self.definition.input_schema.shape()
    }

    /// Tool model advertised to MCP clients.
    pub fn to_tool(&self) -> Tool {
        // Tool arguments are always an object, even for an untyped schema.
        let mut input_schema = self.definition.input_schema.to_json_schema();
        input_schema
            .entry("type")
            .or_insert_with(|| json!("object"));

        Tool {
            name: self.qualified_name.clone().into(),
            description: Some(self.definition.description.clone().into()),
            input_schema: Arc::new(input_schema),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }

    /// Validate `arguments` and run the handler with the parsed value.
    ///
    /// Invalid input never reaches the handler. Handler failures, including
    /// panics, come back as errors for this call only.
    #[instrument(skip_all, fields(tool = %self.qualified_name))]
    pub async fn invoke(&self, arguments: Option<JsonObject>) -> Result<CallToolResult, ToolError> {
        let raw = Value::Object(arguments.unwrap_or_default());

        let input = self.definition.input_schema.validate(&raw).map_err(|e| {
            warn!("Rejected call to {}: {}", self.qualified_name, e);
            ToolError::from(e)
        })?;

        debug!("Invoking {}", self.qualified_name);
        AssertUnwindSafe(self.definition.handler.call(input))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                warn!("Handler for {} panicked", self.qualified_name);
                Err(ToolError::internal(format!(
                    "handler for '{}' panicked",
                    self.qualified_name
                )))
            })
    }
}

// ============================================================================
// Load Report
// ============================================================================

/// A manifest that was discovered but not registered.
#[derive(Debug)]
pub struct SkippedModule {
    pub path: PathBuf,
    pub error: LoadError,
}

/// Summary of one `load_from_directory` pass.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Qualified names registered by this pass, in registration order.
    pub registered: Vec<String>,

    /// Modules skipped, in discovery order.
    pub skipped: Vec<SkippedModule>,

    /// Set when the root directory itself could not be read.
    pub root_error: Option<LoadError>,
}

impl LoadReport {
    /// JSON summary suitable for logging or serving as a resource.
    pub fn to_json(&self) -> Value {
        json!({
            "registered": self.registered,
            "skipped": self.skipped.iter().map(|s| json!({
                "path": s.path.display().to_string(),
                "kind": s.error.kind(),
                "reason": s.error.to_string(),
            })).collect::<Vec<_>>(),
            "root_error": self.root_error.as_ref().map(ToString::to_string),
        })
    }
}

// ============================================================================
// Tool Registry
// ============================================================================

/// Tools loaded from one source, keyed by qualified name.
///
/// Loading happens before the server starts serving; afterwards the registry
/// is only read.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    prefix: String,
    tools: BTreeMap<String, RegisteredTool>,
}

impl ToolRegistry {
    /// Create an empty registry whose tools are namespaced with `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            tools: BTreeMap::new(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Register a single definition.
    ///
    /// The first tool to claim a qualified name keeps it; later duplicates
    /// are rejected.
    pub fn register(&mut self, definition: ToolDefinition) -> Result<&RegisteredTool, LoadError> {
        let name = qualified_name(&self.prefix, &definition.name);
        if self.tools.contains_key(&name) {
            return Err(LoadError::DuplicateName {
                qualified_name: name,
            });
        }

        debug!("Registering tool: {}", name);
        let tool = RegisteredTool {
            qualified_name: name.clone(),
            definition: Arc::new(definition),
        };
        Ok(self.tools.entry(name).or_insert(tool))
    }

    /// Discover manifests under `root` and register every valid tool.
    ///
    /// Never fails: unreadable directories, unparsable files, non-tool
    /// documents and duplicate names are logged and recorded in the report.
    pub fn load_from_directory(
        &mut self,
        root: impl AsRef<Path>,
        catalog: &HandlerCatalog,
    ) -> LoadReport {
        let root = root.as_ref();
        let mut report = LoadReport::default();

        info!(
            "Loading tools from {} (prefix: {:?})",
            root.display(),
            self.prefix
        );

        let discovered = match discover(root, catalog) {
            Ok(discovered) => discovered,
            Err(error) => {
                warn!("Cannot load tools: {}", error);
                report.root_error = Some(error);
                info!("0 tools loaded from {}", root.display());
                return report;
            }
        };

        for item in discovered {
            match item {
                Discovered::Loaded(definition) => {
                    let path = definition.source.clone().unwrap_or_else(|| root.to_path_buf());
                    match self.register(definition) {
                        Ok(tool) => report.registered.push(tool.qualified_name.clone()),
                        Err(error) => {
                            warn!("Skipping {}: {}", path.display(), error);
                            report.skipped.push(SkippedModule { path, error });
                        }
                    }
                }
                Discovered::Failed { path, error } => {
                    warn!("Skipping {}: {}", path.display(), error);
                    report.skipped.push(SkippedModule { path, error });
                }
            }
        }

        info!(
            "{} tools loaded from {} ({} skipped)",
            report.registered.len(),
            root.display(),
            report.skipped.len()
        );
        report
    }

    /// Every registered tool, ordered by qualified name.
    pub fn get_all_tools(&self) -> &BTreeMap<String, RegisteredTool> {
        &self.tools
    }

    pub fn get(&self, qualified_name: &str) -> Option<&RegisteredTool> {
        self.tools.get(qualified_name)
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Call a tool by qualified name.
    pub async fn call_tool(
        &self,
        qualified_name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, ToolError> {
        let tool = self.get(qualified_name).ok_or_else(|| {
            warn!("Unknown tool requested: {}", qualified_name);
            ToolError::not_found(qualified_name)
        })?;
        tool.invoke(arguments).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Config;
    use crate::domains::tools::handlers::ToolHandler;
    use crate::domains::tools::schema::FieldType;
    use async_trait::async_trait;
    use rmcp::model::Content;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Records every input it receives.
    #[derive(Default)]
    struct RecordingHandler {
        calls: Mutex<Vec<Value>>,
    }

    #[async_trait]
    impl ToolHandler for RecordingHandler {
        async fn call(&self, input: Value) -> Result<CallToolResult, ToolError> {
            self.calls.lock().unwrap().push(input);
            Ok(CallToolResult::success(vec![Content::text("recorded")]))
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl ToolHandler for FailingHandler {
        async fn call(&self, _input: Value) -> Result<CallToolResult, ToolError> {
            Err(ToolError::execution_failed("daemon not running"))
        }
    }

    struct PanickingHandler;

    #[async_trait]
    impl ToolHandler for PanickingHandler {
        async fn call(&self, _input: Value) -> Result<CallToolResult, ToolError> {
            panic!("boom")
        }
    }

    fn catalog() -> HandlerCatalog {
        HandlerCatalog::with_builtins(Arc::new(Config::default()))
    }

    fn logs_schema() -> InputSchema {
        InputSchema::object()
            .field("container", InputSchema::of(FieldType::String), true)
            .field(
                "tail",
                InputSchema::of(FieldType::Integer).with_default(json!(100)),
                false,
            )
    }

    fn echo_manifest(name: &str) -> String {
        format!(
            r#"
            name = "{name}"
            description = "Echo text"
            input_schema = {{}}
            [handler]
            kind = "builtin"
            id = "echo"
            "#
        )
    }

    fn args(value: Value) -> Option<JsonObject> {
        value.as_object().cloned()
    }

    /// Collects formatted log output for assertions.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> tracing_subscriber::fmt::MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[test]
    fn test_qualified_name() {
        assert_eq!(qualified_name("docker_", "ps"), "docker_ps");
        assert_eq!(qualified_name("docker", "ps"), "docker_ps");
        assert_eq!(qualified_name("", "ps"), "ps");
        assert_eq!(qualified_name("x_", "echo"), "x_echo");
    }

    #[test]
    fn test_register_namespaces_and_rejects_duplicates() {
        let handler = Arc::new(RecordingHandler::default());
        let mut registry = ToolRegistry::new("docker_");

        let tool = registry
            .register(ToolDefinition::new("ps", "List", logs_schema(), handler.clone()))
            .unwrap();
        assert_eq!(tool.qualified_name(), "docker_ps");
        assert_eq!(tool.shape().into_keys().collect::<Vec<_>>(), vec!["container", "tail"]);

        let err = registry
            .register(ToolDefinition::new("ps", "Again", logs_schema(), handler))
            .unwrap_err();
        assert!(matches!(err, LoadError::DuplicateName { .. }));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get("docker_ps").unwrap().definition().description, "List");
    }

    #[test]
    fn test_load_end_to_end_scenario() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("a")).unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("a/one.tool"), echo_manifest("echo")).unwrap();
        fs::write(dir.path().join("b/bad.tool"), "name = [unterminated").unwrap();

        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .finish();

        let mut registry = ToolRegistry::new("x_");
        let report = tracing::subscriber::with_default(subscriber, || {
            registry.load_from_directory(dir.path(), &catalog())
        });

        assert_eq!(registry.tool_names(), vec!["x_echo"]);
        assert_eq!(report.registered, vec!["x_echo"]);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].path.ends_with("b/bad.tool"));
        assert!(matches!(report.skipped[0].error, LoadError::ModuleLoad { .. }));

        let output = logs.contents();
        let skip_line = output
            .lines()
            .find(|line| line.contains("bad.tool"))
            .expect("skip was logged");
        assert!(skip_line.contains("WARN"), "{skip_line}");
        assert!(output.contains("1 tools loaded"), "{output}");
        assert!(output.contains("(1 skipped)"), "{output}");
    }

    #[test]
    fn test_load_counts_valid_and_invalid_modules() {
        let dir = TempDir::new().unwrap();
        // Interleave valid and invalid files.
        fs::write(dir.path().join("a.tool"), echo_manifest("a")).unwrap();
        fs::write(dir.path().join("b.tool"), "description = \"no name\"").unwrap();
        fs::write(dir.path().join("c.tool"), echo_manifest("c")).unwrap();
        fs::write(dir.path().join("d.tool"), "not toml at all ===").unwrap();
        fs::write(dir.path().join("e.tool"), echo_manifest("e")).unwrap();
        fs::write(dir.path().join("readme.txt"), "ignored").unwrap();

        let mut registry = ToolRegistry::new("");
        let report = registry.load_from_directory(dir.path(), &catalog());

        assert_eq!(registry.len(), 3);
        assert_eq!(report.skipped.len(), 2);
        assert!(report.root_error.is_none());
    }

    #[test]
    fn test_load_is_deterministic() {
        let dir = TempDir::new().unwrap();
        for name in ["zeta", "alpha", "mid"] {
            fs::create_dir_all(dir.path().join(name)).unwrap();
            fs::write(dir.path().join(name).join("t.tool"), echo_manifest(name)).unwrap();
        }

        let mut first = ToolRegistry::new("git");
        let first_report = first.load_from_directory(dir.path(), &catalog());
        let mut second = ToolRegistry::new("git");
        let second_report = second.load_from_directory(dir.path(), &catalog());

        assert_eq!(first.tool_names(), second.tool_names());
        assert_eq!(first_report.registered, second_report.registered);
        assert_eq!(first_report.registered, vec!["git_alpha", "git_mid", "git_zeta"]);
    }

    #[test]
    fn test_duplicate_manifest_names_keep_first() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.tool"), echo_manifest("same")).unwrap();
        fs::write(dir.path().join("b.tool"), echo_manifest("same")).unwrap();

        let mut registry = ToolRegistry::new("rest");
        let report = registry.load_from_directory(dir.path(), &catalog());

        assert_eq!(report.registered, vec!["rest_same"]);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].path.ends_with("b.tool"));
        assert!(matches!(report.skipped[0].error, LoadError::DuplicateName { .. }));
    }

    #[test]
    fn test_missing_root_registers_nothing() {
        let dir = TempDir::new().unwrap();
        let mut registry = ToolRegistry::new("docker");
        let report = registry.load_from_directory(dir.path().join("nope"), &catalog());

        assert!(registry.is_empty());
        assert!(report.registered.is_empty());
        assert!(matches!(report.root_error, Some(LoadError::DirectoryRead { .. })));
        assert!(report.to_json()["root_error"].is_string());
    }

    #[tokio::test]
    async fn test_invalid_input_never_reaches_handler() {
        let handler = Arc::new(RecordingHandler::default());
        let mut registry = ToolRegistry::new("docker");
        registry
            .register(ToolDefinition::new("logs", "Logs", logs_schema(), handler.clone()))
            .unwrap();

        let err = registry
            .call_tool("docker_logs", args(json!({ "tail": "lots" })))
            .await
            .unwrap_err();

        match err {
            ToolError::InvalidArguments(e) => {
                assert!(e.to_string().contains("container: required field is missing"));
                assert!(e.to_string().contains("tail: expected integer"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(handler.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_valid_input_passes_parsed_value_once() {
        let handler = Arc::new(RecordingHandler::default());
        let mut registry = ToolRegistry::new("docker");
        registry
            .register(ToolDefinition::new("logs", "Logs", logs_schema(), handler.clone()))
            .unwrap();

        let result = registry
            .call_tool("docker_logs", args(json!({ "container": "web", "junk": true })))
            .await
            .unwrap();

        assert!(!result.is_error.unwrap_or(false));
        let calls = handler.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], json!({ "container": "web", "tail": 100 }));
    }

    #[tokio::test]
    async fn test_handler_failures_stay_call_level() {
        let mut registry = ToolRegistry::new("");
        registry
            .register(ToolDefinition::new("down", "Fails", InputSchema::object(), Arc::new(FailingHandler)))
            .unwrap();
        registry
            .register(ToolDefinition::new("panic", "Panics", InputSchema::object(), Arc::new(PanickingHandler)))
            .unwrap();

        let err = registry.call_tool("down", None).await.unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed(_)));

        let err = registry.call_tool("panic", None).await.unwrap_err();
        assert!(matches!(err, ToolError::Internal(_)));

        let err = registry.call_tool("missing", None).await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(_)));
    }

    #[test]
    fn test_to_tool_uses_qualified_name_and_schema() {
        let mut registry = ToolRegistry::new("docker");
        let tool = registry
            .register(ToolDefinition::new(
                "logs",
                "Fetch logs",
                logs_schema(),
                Arc::new(RecordingHandler::default()),
            ))
            .unwrap()
            .to_tool();

        assert_eq!(tool.name, "docker_logs");
        assert_eq!(tool.description.as_deref(), Some("Fetch logs"));
        assert_eq!(tool.input_schema["type"], json!("object"));
        assert!(tool.input_schema["properties"]["container"].is_object());
    }
}
