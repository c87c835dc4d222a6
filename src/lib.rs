//! Developer tooling MCP servers.
//!
//! Tools are declared as TOML manifests (docker, git, gh, gcloud, REST, ...)
//! and discovered from one or more source directories at startup. Each
//! source is loaded into its own namespaced registry; broken manifests are
//! logged and skipped without affecting the rest.
//!
//! # Architecture
//!
//! - **core**: Configuration, error handling, path security, the server and transports
//! - **domains**: Business logic organized by bounded contexts
//!   - **tools**: Manifest discovery, registration and validated tool calls
//!   - **resources**: Catalog and load-report views over the loaded tools
//!
//! # Example
//!
//! ```rust,no_run
//! use devtools_mcp_server::{core::Config, core::McpServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::new(config);
//!     println!("{} tools loaded", server.tool_count());
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use crate::core::{Config, Error, McpServer, Result};

use crate::core::TransportService;

/// Load the configured tool sources and serve them on the configured transport.
pub async fn run(config: Config) -> Result<()> {
    if config.registry.sources.is_empty() {
        return Err(Error::config("no tool sources configured"));
    }

    let transport = TransportService::new(config.transport.clone());
    let server = McpServer::new(config);
    transport.run(server).await?;
    Ok(())
}
