//! MCP Server implementation and lifecycle management.
//!
//! This module contains the main server handler that implements the MCP
//! protocol by delegating to domain-specific services.
//!
//! ## Startup
//!
//! `McpServer::new` loads every configured tool source into its own
//! registry, then builds the router and the catalog resources from the
//! result. Loading finishes before any transport is connected, and the
//! registries are read-only from then on.
//!
//! **Adding a new tool does NOT require modifying this file!**

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, handler::server::tool::ToolRouter, model::*,
    service::RequestContext, tool_handler,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::config::Config;
use crate::domains::{
    resources::{ResourceService, SourceReport},
    tools::{HandlerCatalog, ToolError, ToolRegistry, build_tool_router},
};

/// The main MCP server handler.
///
/// This struct implements the `ServerHandler` trait from rmcp and coordinates
/// between different domain services to handle MCP protocol messages.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// One registry per configured tool source, in configuration order.
    registries: Arc<Vec<ToolRegistry>>,

    /// Service for handling resource-related requests.
    resource_service: Arc<ResourceService>,

    /// Tool router for handling tool calls.
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    /// Create a new MCP server, loading every configured tool source.
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);
        let catalog = HandlerCatalog::with_builtins(config.clone());

        let mut registries = Vec::with_capacity(config.registry.sources.len());
        let mut reports = Vec::with_capacity(config.registry.sources.len());

        for source in &config.registry.sources {
            let mut registry = ToolRegistry::new(source.prefix.clone());
            let report = registry.load_from_directory(&source.dir, &catalog);
            registries.push(registry);
            reports.push(SourceReport {
                prefix: source.prefix.clone(),
                dir: source.dir.clone(),
                report,
            });
        }

        let tool_router = build_tool_router::<Self>(&registries);
        let tool_count = tool_router.list_all().len();
        if tool_count == 0 {
            warn!("No tools registered; check the configured tool sources");
        } else {
            info!("{} tools available", tool_count);
        }

        let registries = Arc::new(registries);
        let resource_service = Arc::new(ResourceService::new(
            registries.clone(),
            Arc::new(reports),
        ));

        Self {
            config,
            registries,
            resource_service,
            tool_router,
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    /// The loaded registries, in configuration order.
    pub fn registries(&self) -> &[ToolRegistry] {
        &self.registries
    }

    /// Number of tools exposed to clients.
    pub fn tool_count(&self) -> usize {
        self.tool_router.list_all().len()
    }

    /// Call a tool by qualified name without going through a transport.
    ///
    /// Registries are searched in order, so the tool a client would reach
    /// is the one called here.
    pub async fn invoke_tool(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> crate::core::Result<CallToolResult> {
        let tool = self
            .registries
            .iter()
            .find_map(|registry| registry.get(name))
            .ok_or_else(|| ToolError::not_found(name))?;
        Ok(tool.invoke(arguments).await?)
    }

    /// Read a catalog resource without going through a transport.
    pub async fn read_catalog(&self, uri: &str) -> crate::core::Result<ReadResourceResult> {
        Ok(self.resource_service.read_resource(uri).await?)
    }
}

/// ServerHandler implementation with tool_handler macro for automatic tool routing.
#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(format!(
                "{} exposes developer tooling as MCP tools. Read mcp://tools/catalog for the \
                 tool list and mcp://tools/load-report for tools that failed to load.",
                self.config.server.name
            )),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_resources()
                .build(),
            server_info: Implementation {
                name: self.config.server.name.clone(),
                version: self.config.server.version.clone(),
                ..Implementation::from_build_env()
            },
            ..Default::default()
        }
    }

    #[instrument(skip(self, _context))]
    async fn list_resources(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListResourcesResult, McpError> {
        info!("Listing resources");
        let resources = self.resource_service.list_resources().await;
        Ok(ListResourcesResult {
            resources,
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self, _context))]
    async fn read_resource(
        &self,
        request: ReadResourceRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<ReadResourceResult, McpError> {
        info!("Reading resource: {}", request.uri);
        self.resource_service
            .read_resource(&request.uri)
            .await
            .map_err(|e| McpError::resource_not_found(e.to_string(), None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Error;
    use crate::core::config::ToolSource;
    use serde_json::json;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

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

    fn config_for(sources: &[(&str, &Path)]) -> Config {
        let mut config = Config::default();
        config.registry.sources = sources
            .iter()
            .map(|(prefix, dir)| ToolSource {
                prefix: prefix.to_string(),
                dir: dir.to_path_buf(),
            })
            .collect();
        config
    }

    #[test]
    fn test_server_loads_every_source() {
        let docker = TempDir::new().unwrap();
        let git = TempDir::new().unwrap();
        fs::write(docker.path().join("echo.tool"), echo_manifest("echo")).unwrap();
        fs::write(git.path().join("echo.tool"), echo_manifest("echo")).unwrap();
        fs::write(git.path().join("bad.tool"), "name = 1").unwrap();

        let server = McpServer::new(config_for(&[("docker", docker.path()), ("git", git.path())]));

        assert_eq!(server.registries().len(), 2);
        assert_eq!(server.tool_count(), 2);
        assert_eq!(server.registries()[0].tool_names(), vec!["docker_echo"]);
        assert_eq!(server.registries()[1].tool_names(), vec!["git_echo"]);
    }

    #[test]
    fn test_missing_source_is_not_fatal() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        let server = McpServer::new(config_for(&[("gh", missing.as_path())]));
        assert_eq!(server.tool_count(), 0);
    }

    #[tokio::test]
    async fn test_call_tool_validates_input() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("echo.tool"), echo_manifest("echo")).unwrap();
        let server = McpServer::new(config_for(&[("x_", dir.path())]));

        let ok = server
            .invoke_tool("x_echo", json!({ "text": "hi" }).as_object().cloned())
            .await
            .unwrap();
        assert!(!ok.is_error.unwrap_or(false));

        let err = server.invoke_tool("x_echo", None).await.unwrap_err();
        assert!(matches!(err, Error::Tool(ToolError::InvalidArguments(_))));

        let err = server.invoke_tool("echo", None).await.unwrap_err();
        assert!(matches!(err, Error::Tool(ToolError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_load_report_resource_reflects_skips() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("bad.tool"), "description = \"no name\"").unwrap();
        let server = McpServer::new(config_for(&[("rest", dir.path())]));

        let result = server.read_catalog("mcp://tools/load-report").await.unwrap();
        match &result.contents[0] {
            ResourceContents::TextResourceContents { text, .. } => {
                let report: serde_json::Value = serde_json::from_str(text).unwrap();
                assert_eq!(report["sources"][0]["prefix"], "rest");
                assert_eq!(report["sources"][0]["skipped"].as_array().unwrap().len(), 1);
            }
            _ => panic!("Expected text contents"),
        }

        let err = server.read_catalog("mcp://tools/missing").await.unwrap_err();
        assert!(matches!(err, Error::Resource(_)));
    }

    #[tokio::test]
    async fn test_bundled_manifests_load_cleanly() {
        let tools = Path::new(env!("CARGO_MANIFEST_DIR")).join("tools");
        let server = McpServer::new(config_for(&[
            ("docker", tools.join("docker").as_path()),
            ("git", tools.join("git").as_path()),
            ("gh", tools.join("github").as_path()),
            ("gcloud", tools.join("gcloud").as_path()),
            ("rest", tools.join("rest").as_path()),
        ]));

        assert_eq!(server.tool_count(), 12);
        assert!(server.registries()[0].get("docker_logs").is_some());
        assert!(server.registries()[2].get("gh_pr_list").is_some());

        let report = server.read_catalog("mcp://tools/load-report").await.unwrap();
        match &report.contents[0] {
            ResourceContents::TextResourceContents { text, .. } => {
                let report: serde_json::Value = serde_json::from_str(text).unwrap();
                for source in report["sources"].as_array().unwrap() {
                    assert!(source["skipped"].as_array().unwrap().is_empty(), "{source}");
                }
            }
            _ => panic!("Expected text contents"),
        }
    }

    #[test]
    fn test_server_info() {
        let dir = TempDir::new().unwrap();
        let server = McpServer::new(config_for(&[("", dir.path())]));
        let info = server.get_info();
        assert_eq!(info.server_info.name, "devtools-mcp-server");
        assert!(info.capabilities.tools.is_some());
        assert!(info.capabilities.resources.is_some());
    }
}
