//! Configuration management for the MCP server.
//!
//! Configuration is assembled from defaults and `MCP_*` environment
//! variables (optionally read from a `.env` file).

use super::transport::TransportConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{info, warn};

/// Main configuration structure for the MCP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Server identification and metadata.
    pub server: ServerConfig,

    /// Where tool manifests are discovered and how they are namespaced.
    pub registry: RegistryConfig,

    /// Limits and endpoints used when tools run.
    pub execution: ExecutionConfig,

    /// Logging configuration.
    pub logging: LoggingConfig,

    /// Transport configuration.
    pub transport: TransportConfig,

    /// Security and path validation configuration.
    pub security: SecurityConfig,
}

/// Server identification configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The name of the server as reported to clients.
    pub name: String,

    /// The version of the server.
    pub version: String,
}

/// One directory tree of tool manifests, loaded into its own registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolSource {
    /// Namespace prefix applied to every tool found under `dir`.
    pub prefix: String,

    /// Root directory scanned recursively for manifests.
    pub dir: PathBuf,
}

/// Tool discovery configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Sources are loaded in order; each gets an independent registry.
    pub sources: Vec<ToolSource>,
}

/// Configuration for tool execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    /// Default timeout for command-backed tools, in seconds.
    pub command_timeout_secs: u64,

    /// Base URL that relative paths in `http_request` calls are joined onto.
    pub http_base_url: Option<String>,

    /// Timeout for outgoing HTTP requests, in seconds.
    pub http_timeout_secs: u64,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "trace").
    pub level: String,

    /// Whether to include timestamps in log output.
    pub with_timestamps: bool,
}

/// Configuration for security and path validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Optional root directory that tool working directories must live under.
    /// If None, no path restrictions are enforced.
    pub root_path: Option<PathBuf>,

    /// Whether a working directory may be given as a symlink.
    pub allow_symlinks: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            sources: vec![ToolSource {
                prefix: String::new(),
                dir: PathBuf::from("tools"),
            }],
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            command_timeout_secs: 60,
            http_base_url: None,
            http_timeout_secs: 30,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            root_path: None,
            allow_symlinks: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                name: "devtools-mcp-server".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            registry: RegistryConfig::default(),
            execution: ExecutionConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                with_timestamps: true,
            },
            transport: TransportConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables are expected to be prefixed with `MCP_`.
    /// For example: `MCP_SERVER_NAME`, `MCP_TOOL_SOURCES`.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(name) = std::env::var("MCP_SERVER_NAME") {
            config.server.name = name;
        }

        if let Ok(level) = std::env::var("MCP_LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(with_timestamps) = parse_env::<bool>("MCP_LOG_TIMESTAMPS") {
            config.logging.with_timestamps = with_timestamps;
        }

        config.registry = RegistryConfig::from_env();
        config.transport = TransportConfig::from_env();

        if let Some(secs) = parse_env::<u64>("MCP_COMMAND_TIMEOUT_SECS") {
            config.execution.command_timeout_secs = secs;
        }
        if let Some(secs) = parse_env::<u64>("MCP_HTTP_TIMEOUT_SECS") {
            config.execution.http_timeout_secs = secs;
        }
        if let Ok(base_url) = std::env::var("MCP_HTTP_BASE_URL") {
            config.execution.http_base_url = Some(base_url);
        }

        if let Ok(root_path) = std::env::var("MCP_ROOT_PATH") {
            config.security.root_path = Some(PathBuf::from(root_path));
            info!("Path security enabled: root directory set to {:?}", config.security.root_path);
        } else {
            warn!(
                "MCP_ROOT_PATH not set - tool working directories are not restricted"
            );
        }

        if let Ok(allow_symlinks) = std::env::var("MCP_ALLOW_SYMLINKS") {
            config.security.allow_symlinks = allow_symlinks.parse().unwrap_or(true);
            info!("Symlinks allowed: {}", config.security.allow_symlinks);
        }

        config
    }
}

impl RegistryConfig {
    /// Read tool sources from the environment.
    ///
    /// `MCP_TOOL_SOURCES` takes precedence and holds comma-separated
    /// `prefix=dir` pairs. Otherwise a single source is built from
    /// `MCP_TOOLS_DIR` and `MCP_TOOL_PREFIX`.
    pub fn from_env() -> Self {
        if let Ok(raw) = std::env::var("MCP_TOOL_SOURCES") {
            let sources = parse_sources(&raw);
            if !sources.is_empty() {
                return Self { sources };
            }
            warn!("MCP_TOOL_SOURCES is set but contains no usable entries");
        }

        let mut config = Self::default();
        if let Some(source) = config.sources.first_mut() {
            if let Ok(dir) = std::env::var("MCP_TOOLS_DIR") {
                source.dir = PathBuf::from(dir);
            }
            if let Ok(prefix) = std::env::var("MCP_TOOL_PREFIX") {
                source.prefix = prefix;
            }
        }
        config
    }
}

/// Parse `prefix=dir` pairs separated by commas.
///
/// An entry without `=` is treated as a directory with an empty prefix.
pub fn parse_sources(raw: &str) -> Vec<ToolSource> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| {
            let (prefix, dir) = match entry.split_once('=') {
                Some((prefix, dir)) => (prefix.trim(), dir.trim()),
                None => ("", entry),
            };
            if dir.is_empty() {
                warn!("Ignoring tool source without a directory: {}", entry);
                return None;
            }
            Some(ToolSource {
                prefix: prefix.to_string(),
                dir: PathBuf::from(dir),
            })
        })
        .collect()
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    let raw = std::env::var(key).ok()?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring invalid value for {}: {}", key, raw);
            None
        }
    }
}
