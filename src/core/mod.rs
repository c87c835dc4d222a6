//! Core module: configuration, errors, path security, the MCP server
//! handler and its transports. Nothing in here knows about individual
//! tools; those live in `domains`.

pub mod config;
pub mod error;
pub mod security;
pub mod server;
pub mod transport;

pub use config::{Config, ToolSource};
pub use error::{Error, Result};
pub use security::PathSecurityError;
pub use server::McpServer;
pub use transport::{TransportConfig, TransportService};
