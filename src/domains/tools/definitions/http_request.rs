//! Generic REST builtin.
//!
//! Sends one HTTP request and returns the status line and body. Relative
//! URLs are joined onto the configured base URL, which is how a REST server
//! namespace points all of its tools at one API.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use rmcp::model::{CallToolResult, Content};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::core::config::ExecutionConfig;
use crate::domains::tools::error::ToolError;
use crate::domains::tools::handlers::ToolHandler;
use crate::domains::tools::schema::InputSchema;

/// Parameters for the HTTP request builtin.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct HttpRequestParams {
    /// HTTP method: GET, POST, PUT, PATCH, DELETE or HEAD.
    #[serde(default = "default_method")]
    pub method: String,

    /// Absolute URL, or a path relative to the configured base URL.
    pub url: String,

    /// Query string parameters.
    #[serde(default)]
    pub query: BTreeMap<String, String>,

    /// Extra request headers.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// JSON request body.
    #[serde(default)]
    pub body: Option<Value>,
}

fn default_method() -> String {
    "GET".to_string()
}

pub struct HttpRequestTool {
    client: reqwest::Client,
    base_url: Option<String>,
    timeout_secs: u64,
}

impl HttpRequestTool {
    /// Catalog id used by manifests.
    pub const ID: &'static str = "http_request";

    pub fn new(config: &ExecutionConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .user_agent(concat!("devtools-mcp-server/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default HTTP client: {}", e);
                reqwest::Client::new()
            });

        Self {
            client,
            base_url: config.http_base_url.clone(),
            timeout_secs: config.http_timeout_secs,
        }
    }

    pub fn input_schema() -> InputSchema {
        InputSchema::for_type::<HttpRequestParams>()
    }

    /// Absolute URLs pass through; anything else needs a base URL.
    pub fn resolve_url(&self, url: &str) -> Result<String, ToolError> {
        if url.starts_with("http://") || url.starts_with("https://") {
            return Ok(url.to_string());
        }
        match &self.base_url {
            Some(base) => Ok(format!(
                "{}/{}",
                base.trim_end_matches('/'),
                url.trim_start_matches('/')
            )),
            None => Err(ToolError::invalid_arguments(format!(
                "url: '{}' is relative and MCP_HTTP_BASE_URL is not set",
                url
            ))),
        }
    }
}

fn parse_method(method: &str) -> Result<Method, ToolError> {
    match method.to_ascii_uppercase().as_str() {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "PATCH" => Ok(Method::PATCH),
        "DELETE" => Ok(Method::DELETE),
        "HEAD" => Ok(Method::HEAD),
        other => Err(ToolError::invalid_arguments(format!(
            "method: unsupported HTTP method '{other}'"
        ))),
    }
}

#[async_trait]
impl ToolHandler for HttpRequestTool {
    #[instrument(skip_all)]
    async fn call(&self, input: Value) -> Result<CallToolResult, ToolError> {
        let params: HttpRequestParams =
            serde_json::from_value(input).map_err(|e| ToolError::invalid_arguments(e.to_string()))?;

        let method = parse_method(&params.method)?;
        let url = self.resolve_url(&params.url)?;
        info!("{} {}", method, url);

        let mut request = self.client.request(method, &url).query(&params.query);
        for (name, value) in &params.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &params.body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                ToolError::Timeout(self.timeout_secs)
            } else {
                ToolError::execution_failed(format!("Request to {} failed: {}", url, e))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ToolError::execution_failed(format!("Failed to read response body: {e}")))?;

        let body = match serde_json::from_str::<Value>(&body) {
            Ok(json) => serde_json::to_string_pretty(&json).unwrap_or(body),
            Err(_) => body,
        };
        let text = format!("HTTP {}\n\n{}", status, body);

        if status.is_success() {
            Ok(CallToolResult::success(vec![Content::text(text)]))
        } else {
            warn!("{} returned {}", url, status);
            Ok(CallToolResult::error(vec![Content::text(text)]))
        }
    }
}
