//! Tool Router - builds the rmcp ToolRouter from loaded registries.
//!
//! Every registered tool becomes one dynamic route. The route validates the
//! call through [`RegisteredTool::invoke`] and maps tool errors onto the MCP
//! protocol: bad input is an `invalid_params` protocol error, anything that
//! went wrong while running the tool is an error result the agent can read.

use std::collections::HashSet;

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, ToolRouter},
    model::{CallToolResult, Content},
};
use tracing::warn;

use super::error::ToolError;
use super::registry::{RegisteredTool, ToolRegistry};

/// Create a route for one registered tool.
pub fn create_route<S>(tool: RegisteredTool) -> ToolRoute<S>
where
    S: Send + Sync + 'static,
{
    ToolRoute::new_dyn(tool.to_tool(), move |ctx: ToolCallContext<'_, S>| {
        let args = ctx.arguments.clone();
        let tool = tool.clone();
        async move { into_call_result(tool.invoke(args).await) }.boxed()
    })
}

fn into_call_result(result: Result<CallToolResult, ToolError>) -> Result<CallToolResult, McpError> {
    match result {
        Ok(result) => Ok(result),
        Err(ToolError::InvalidArguments(e)) => Err(McpError::invalid_params(e.to_string(), None)),
        Err(e) => Ok(CallToolResult::error(vec![Content::text(e.to_string())])),
    }
}

/// Build the tool router from every loaded registry.
///
/// Registries are routed in order. If two registries expose the same
/// qualified name, the earlier one keeps it.
pub fn build_tool_router<S>(registries: &[ToolRegistry]) -> ToolRouter<S>
where
    S: Send + Sync + 'static,
{
    let mut router = ToolRouter::new();
    let mut routed = HashSet::new();
    for registry in registries {
        for (name, tool) in registry.get_all_tools() {
            if !routed.insert(name.as_str()) {
                warn!(
                    "Tool {} from prefix {:?} shadowed by an earlier source",
                    name,
                    registry.prefix()
                );
                continue;
            }
            router = router.with_route(create_route(tool.clone()));
        }
    }
    router
}
