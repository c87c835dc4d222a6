//! Tool-specific error types.
//!
//! [`LoadError`] covers everything that can go wrong while discovering and
//! registering tools; [`ToolError`] covers a single tool call.

use std::path::PathBuf;

use thiserror::Error;

use super::schema::ValidationError;

/// Errors that can occur during tool calls.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool was not found.
    #[error("Tool not found: {0}")]
    NotFound(String),

    /// The call arguments failed the tool's input schema.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(#[from] ValidationError),

    /// The tool execution failed.
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// The tool timed out during execution.
    #[error("Tool execution timed out after {0}s")]
    Timeout(u64),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Create a new "not found" error.
    pub fn not_found(name: impl Into<String>) -> Self {
        Self::NotFound(name.into())
    }

    /// Create a new "invalid arguments" error from a single message.
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(ValidationError::single(msg))
    }

    /// Create a new "execution failed" error.
    pub fn execution_failed(msg: impl Into<String>) -> Self {
        Self::ExecutionFailed(msg.into())
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Errors raised while discovering and registering tool manifests.
///
/// None of these abort a load pass: the offending file is skipped and the
/// error is recorded in the load report.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The file could not be read or is not valid TOML.
    #[error("failed to load module {}: {reason}", path.display())]
    ModuleLoad { path: PathBuf, reason: String },

    /// The file parsed but does not describe a tool.
    #[error("{} is not a tool definition: {reason}", path.display())]
    ShapeValidation { path: PathBuf, reason: String },

    /// The input schema could not be decoded.
    #[error("invalid input schema in {}: {reason}", path.display())]
    Schema { path: PathBuf, reason: String },

    /// A directory could not be listed.
    #[error("cannot read directory {}: {source}", path.display())]
    DirectoryRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Another tool already claimed this qualified name.
    #[error("duplicate tool name '{qualified_name}' (already registered)")]
    DuplicateName { qualified_name: String },
}

impl LoadError {
    /// Create a module load error.
    pub fn module_load(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::ModuleLoad {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Create a shape validation error.
    pub fn shape(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ShapeValidation {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a schema decoding error.
    pub fn schema(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Schema {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Short, stable label for reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ModuleLoad { .. } => "module_load",
            Self::ShapeValidation { .. } => "shape_validation",
            Self::Schema { .. } => "schema",
            Self::DirectoryRead { .. } => "directory_read",
            Self::DuplicateName { .. } => "duplicate_name",
        }
    }
}
