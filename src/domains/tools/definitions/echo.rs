//! Echo builtin.
//!
//! Returns its input text unchanged. Handy for checking that a server is
//! wired up end to end.

use async_trait::async_trait;
use rmcp::model::{CallToolResult, Content};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::domains::tools::error::ToolError;
use crate::domains::tools::handlers::ToolHandler;
use crate::domains::tools::schema::InputSchema;

/// Parameters for the echo builtin.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct EchoParams {
    /// Text to send back.
    pub text: String,
}

pub struct EchoTool;

impl EchoTool {
    /// Catalog id used by manifests.
    pub const ID: &'static str = "echo";

    pub fn input_schema() -> InputSchema {
        InputSchema::for_type::<EchoParams>()
    }
}

#[async_trait]
impl ToolHandler for EchoTool {
    async fn call(&self, input: Value) -> Result<CallToolResult, ToolError> {
        let params: EchoParams =
            serde_json::from_value(input).map_err(|e| ToolError::invalid_arguments(e.to_string()))?;
        debug!("Echoing {} bytes", params.text.len());
        Ok(CallToolResult::success(vec![Content::text(params.text)]))
    }
}
