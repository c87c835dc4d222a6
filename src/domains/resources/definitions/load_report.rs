//! Load report resource definition.

use serde_json::{Value, json};

use super::ResourceDefinition;
use crate::domains::resources::error::ResourceError;
use crate::domains::resources::service::CatalogContext;

/// JSON summary of the startup load, one entry per tool source.
pub struct LoadReportResource;

impl ResourceDefinition for LoadReportResource {
    const URI: &'static str = "mcp://tools/load-report";
    const NAME: &'static str = "Tool Load Report";
    const DESCRIPTION: &'static str = "Registered tools and skipped modules for each tool source";
    const MIME_TYPE: &'static str = "application/json";

    fn render(ctx: &CatalogContext<'_>) -> Result<String, ResourceError> {
        let sources: Vec<Value> = ctx
            .reports
            .iter()
            .map(|source| {
                let mut entry = source.report.to_json();
                if let Value::Object(map) = &mut entry {
                    map.insert("prefix".to_string(), json!(source.prefix));
                    map.insert("dir".to_string(), json!(source.dir.display().to_string()));
                }
                entry
            })
            .collect();

        Ok(serde_json::to_string_pretty(&json!({ "sources": sources }))?)
    }
}
