//! Command-backed tools.
//!
//! Most developer tools are thin wrappers around a CLI (`docker`, `git`,
//! `gh`, `gcloud`, `kubectl`). A command handler builds an argument vector
//! from a template and the validated input, runs the program and reports
//! its output as text.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rmcp::model::{CallToolResult, Content};
use serde::Deserialize;
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

use crate::core::config::Config;
use crate::core::security::validate_directory;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::handlers::ToolHandler;

// ============================================================================
// Handler Spec
// ============================================================================

/// `[handler]` table for `kind = "command"`.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandSpec {
    /// Program to execute, looked up on `PATH`.
    pub program: String,

    /// Argument templates. `{field}` is replaced by the input value; an
    /// argument referring to an absent field is dropped.
    ///
    /// Only the argument holding the placeholder is dropped, so an option
    /// that takes a value must be written as one argument (`--repo={repo}`).
    /// A standalone `{field}` is a positional argument: its value may not
    /// start with `-` unless a literal `--` comes before it.
    #[serde(default)]
    pub args: Vec<String>,

    /// Boolean input field -> flag appended when the field is true.
    #[serde(default)]
    pub flags: BTreeMap<String, String>,

    /// Input field holding the directory to run in.
    #[serde(default)]
    pub working_dir_field: Option<String>,

    /// Overrides the configured default timeout.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

// ============================================================================
// Tool Handler
// ============================================================================

pub struct CommandTool {
    spec: CommandSpec,
    config: Arc<Config>,
}

impl CommandTool {
    pub fn new(spec: CommandSpec, config: Arc<Config>) -> Self {
        Self { spec, config }
    }

    /// Expand the argument templates and flags against `input`.
    pub fn build_args(&self, input: &Value) -> Result<Vec<String>, ToolError> {
        let mut args = Vec::new();
        let mut end_of_options = false;

        for template in &self.spec.args {
            if let Some(field) = whole_placeholder(template) {
                let values: Vec<String> = match input.get(field) {
                    Some(Value::Array(items)) => items.iter().filter_map(render_value).collect(),
                    Some(value) => render_value(value).into_iter().collect(),
                    None => Vec::new(),
                };
                if !end_of_options {
                    if let Some(option) = values.iter().find(|v| v.starts_with('-')) {
                        return Err(ToolError::invalid_arguments(format!(
                            "{field}: value {option:?} would be read as an option"
                        )));
                    }
                }
                args.extend(values);
                continue;
            }

            if let Some(arg) = render_template(template, input) {
                end_of_options |= arg == "--";
                args.push(arg);
            }
        }

        for (field, flag) in &self.spec.flags {
            if input.get(field).and_then(Value::as_bool) == Some(true) {
                args.push(flag.clone());
            }
        }

        Ok(args)
    }

    fn timeout(&self) -> u64 {
        self.spec
            .timeout_secs
            .unwrap_or(self.config.execution.command_timeout_secs)
    }

    fn working_dir(&self, input: &Value) -> Result<Option<PathBuf>, String> {
        let Some(field) = &self.spec.working_dir_field else {
            return Ok(None);
        };
        match input.get(field).and_then(Value::as_str) {
            Some(dir) if !dir.is_empty() => validate_directory(dir, &self.config.security)
                .map(Some)
                .map_err(|e| format!("Path security validation failed: {e}")),
            _ => Ok(None),
        }
    }

    fn command_line(&self, args: &[String]) -> String {
        std::iter::once(self.spec.program.as_str())
            .chain(args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl ToolHandler for CommandTool {
    #[instrument(skip_all, fields(program = %self.spec.program))]
    async fn call(&self, input: Value) -> Result<CallToolResult, ToolError> {
        let args = self.build_args(&input).inspect_err(|e| warn!("{}", e))?;
        let command_line = self.command_line(&args);

        let working_dir = match self.working_dir(&input) {
            Ok(dir) => dir,
            Err(message) => {
                warn!("{}", message);
                return Ok(CallToolResult::error(vec![Content::text(message)]));
            }
        };

        info!("Running: {}", command_line);

        let mut command = Command::new(&self.spec.program);
        command
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = &working_dir {
            command.current_dir(dir);
        }

        let timeout = self.timeout();
        let output = match tokio::time::timeout(Duration::from_secs(timeout), command.output()).await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ToolError::execution_failed(format!(
                    "Failed to run '{}': {}",
                    self.spec.program, e
                )));
            }
            Err(_) => {
                warn!("Command timed out after {}s: {}", timeout, command_line);
                return Err(ToolError::Timeout(timeout));
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if output.status.success() {
            debug!("Command succeeded with {} bytes of output", output.stdout.len());
            let text = stdout.trim_end();
            let text = if text.is_empty() {
                "Command completed successfully (no output)".to_string()
            } else {
                text.to_string()
            };
            return Ok(CallToolResult::success(vec![Content::text(text)]));
        }

        let status = output
            .status
            .code()
            .map(|code| code.to_string())
            .unwrap_or_else(|| "signal".to_string());
        warn!("Command exited with status {}: {}", status, command_line);

        let mut message = format!("Command `{}` exited with status {}", command_line, status);
        let detail = if stderr.trim().is_empty() { stdout.trim() } else { stderr.trim() };
        if !detail.is_empty() {
            message.push_str(":\n");
            message.push_str(detail);
        }
        Ok(CallToolResult::error(vec![Content::text(message)]))
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// `"{name}"` -> `Some("name")`.
fn whole_placeholder(template: &str) -> Option<&str> {
    template
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .filter(|name| is_field_name(name))
}

fn is_field_name(name: &str) -> bool {
    !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Substitute every `{field}` in `template`.
///
/// Braces that do not enclose a field name (such as docker's `{{json .}}`)
/// are copied verbatim. Returns `None` when a referenced field has no
/// usable value.
fn render_template(template: &str, input: &Value) -> Option<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) if is_field_name(&after[..end]) => {
                let value = input.get(&after[..end])?;
                out.push_str(&render_value(value)?);
                rest = &after[end + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Some(out)
}

fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::SecurityConfig;
    use serde_json::json;

    fn tool(program: &str, args: &[&str]) -> CommandTool {
        CommandTool::new(
            CommandSpec {
                program: program.to_string(),
                args: args.iter().map(|a| a.to_string()).collect(),
                flags: BTreeMap::new(),
                working_dir_field: None,
                timeout_secs: None,
            },
            Arc::new(Config::default()),
        )
    }

    fn text_of(result: &CallToolResult) -> &str {
        match &result.content[0].raw {
            rmcp::model::RawContent::Text(text) => &text.text,
            _ => panic!("Expected text content"),
        }
    }

    #[test]
    fn test_build_args_substitutes_and_drops() {
        let tool = tool(
            "docker",
            &["logs", "--tail={tail}", "--since={since}", "{container}"],
        );
        let args = tool
            .build_args(&json!({ "container": "web", "tail": 50 }))
            .unwrap();
        assert_eq!(args, vec!["logs", "--tail=50", "web"]);
    }

    #[test]
    fn test_build_args_keeps_go_templates() {
        let tool = tool("docker", &["ps", "--format", "{{json .}}"]);
        let args = tool.build_args(&json!({})).unwrap();
        assert_eq!(args, vec!["ps", "--format", "{{json .}}"]);
    }

    #[test]
    fn test_build_args_expands_arrays_and_flags() {
        let mut tool = tool("git", &["add", "{paths}"]);
        tool.spec.flags.insert("all".to_string(), "--all".to_string());
        tool.spec.flags.insert("dry_run".to_string(), "--dry-run".to_string());

        let args = tool.build_args(&json!({
            "paths": ["src/lib.rs", "README.md"],
            "all": false,
            "dry_run": true
        }))
        .unwrap();
        assert_eq!(args, vec!["add", "src/lib.rs", "README.md", "--dry-run"]);
    }

    #[test]
    fn test_build_args_empty_string_drops_option() {
        let tool = tool("gh", &["pr", "list", "--label={label}", "--json", "number"]);
        let args = tool.build_args(&json!({ "label": "" })).unwrap();
        assert_eq!(args, vec!["pr", "list", "--json", "number"]);
    }

    #[test]
    fn test_build_args_rejects_option_in_positional() {
        let tool = tool("git", &["log", "--max-count={limit}", "{revision}"]);
        let err = tool
            .build_args(&json!({ "limit": 20, "revision": "--output=/tmp/out" }))
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
        assert!(err.to_string().contains("revision"));

        let args = tool
            .build_args(&json!({ "limit": 20, "revision": "main" }))
            .unwrap();
        assert_eq!(args, vec!["log", "--max-count=20", "main"]);
    }

    #[test]
    fn test_build_args_rejects_option_in_array() {
        let tool = tool("git", &["add", "{paths}"]);
        let err = tool
            .build_args(&json!({ "paths": ["src", "--chmod=+x"] }))
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn test_build_args_allows_dashes_after_separator() {
        let tool = tool("git", &["add", "--", "{paths}"]);
        let args = tool.build_args(&json!({ "paths": ["-weird-name"] })).unwrap();
        assert_eq!(args, vec!["add", "--", "-weird-name"]);
    }

    #[tokio::test]
    async fn test_call_rejects_option_injection() {
        let tool = tool("git", &["log", "{revision}"]);
        let err = tool
            .call(json!({ "revision": "--output=/tmp/out" }))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn test_timeout_prefers_spec() {
        let mut tool = tool("sleep", &[]);
        assert_eq!(tool.timeout(), 60);
        tool.spec.timeout_secs = Some(2);
        assert_eq!(tool.timeout(), 2);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_success_returns_stdout() {
        let tool = tool("echo", &["hello", "{name}"]);
        let result = tool.call(json!({ "name": "world" })).await.unwrap();
        assert!(!result.is_error.unwrap_or(false));
        assert_eq!(text_of(&result), "hello world");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_failure_is_error_result() {
        let tool = tool("sh", &["-c", "echo boom >&2; exit 3"]);
        let result = tool.call(json!({})).await.unwrap();
        assert!(result.is_error.unwrap_or(false));
        let text = text_of(&result);
        assert!(text.contains("exited with status 3"));
        assert!(text.contains("boom"));
    }

    #[tokio::test]
    async fn test_missing_program_is_execution_error() {
        let tool = tool("definitely-not-a-real-binary-1234", &[]);
        let err = tool.call(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::ExecutionFailed(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_timeout() {
        let mut tool = tool("sleep", &["5"]);
        tool.spec.timeout_secs = Some(1);
        let err = tool.call(json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::Timeout(1)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_working_dir_outside_root_is_rejected() {
        let root = tempfile::TempDir::new().unwrap();
        let outside = tempfile::TempDir::new().unwrap();

        let mut config = Config::default();
        config.security = SecurityConfig {
            root_path: Some(root.path().to_path_buf()),
            allow_symlinks: true,
        };
        let tool = CommandTool::new(
            CommandSpec {
                program: "pwd".to_string(),
                args: Vec::new(),
                flags: BTreeMap::new(),
                working_dir_field: Some("path".to_string()),
                timeout_secs: None,
            },
            Arc::new(config),
        );

        let result = tool
            .call(json!({ "path": outside.path().to_str().unwrap() }))
            .await
            .unwrap();
        assert!(result.is_error.unwrap_or(false));
        assert!(text_of(&result).contains("Path security validation failed"));

        let inside = tool
            .call(json!({ "path": root.path().to_str().unwrap() }))
            .await
            .unwrap();
        assert!(!inside.is_error.unwrap_or(false));
    }
}
