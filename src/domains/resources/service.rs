//! Resource service implementation.
//!
//! The ResourceService exposes read-only views of the loaded tool sources.
//! Resources are defined in `definitions/` and registered via `registry.rs`.
//! Adding a new resource does NOT require modifying this file.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use rmcp::model::{ReadResourceResult, Resource, ResourceContents};
use tracing::{debug, info};

use super::error::ResourceError;
use super::registry::get_all_resources;
use crate::domains::tools::{LoadReport, ToolRegistry};

/// Outcome of loading one configured tool source.
#[derive(Debug)]
pub struct SourceReport {
    pub prefix: String,
    pub dir: PathBuf,
    pub report: LoadReport,
}

/// Everything a resource may render from.
#[derive(Debug, Clone, Copy)]
pub struct CatalogContext<'a> {
    pub registries: &'a [ToolRegistry],
    pub reports: &'a [SourceReport],
}

/// Renders the content of one resource.
pub type RenderFn = fn(&CatalogContext<'_>) -> Result<String, ResourceError>;

/// An entry in the resource registry.
#[derive(Clone)]
pub struct ResourceEntry {
    /// The resource metadata.
    pub resource: Resource,

    pub render: RenderFn,
}

/// Service for listing and reading resources.
pub struct ResourceService {
    /// Key: resource URI.
    resources: BTreeMap<String, ResourceEntry>,

    registries: Arc<Vec<ToolRegistry>>,
    reports: Arc<Vec<SourceReport>>,
}

impl ResourceService {
    /// Create a new ResourceService over the loaded tool sources.
    pub fn new(registries: Arc<Vec<ToolRegistry>>, reports: Arc<Vec<SourceReport>>) -> Self {
        info!("Initializing ResourceService");

        let mut service = Self {
            resources: BTreeMap::new(),
            registries,
            reports,
        };

        for entry in get_all_resources() {
            service.register_resource(entry);
        }

        service
    }

    /// Register a resource.
    pub fn register_resource(&mut self, entry: ResourceEntry) {
        info!("Registering resource: {}", entry.resource.raw.uri);
        self.resources
            .insert(entry.resource.raw.uri.to_string(), entry);
    }

    /// List all available resources.
    pub async fn list_resources(&self) -> Vec<Resource> {
        self.resources
            .values()
            .map(|entry| entry.resource.clone())
            .collect()
    }

    /// Read a resource by URI.
    pub async fn read_resource(&self, uri: &str) -> Result<ReadResourceResult, ResourceError> {
        let entry = self
            .resources
            .get(uri)
            .ok_or_else(|| ResourceError::not_found(uri))?;

        debug!("Rendering resource {}", uri);
        let ctx = CatalogContext {
            registries: &self.registries,
            reports: &self.reports,
        };
        let text = (entry.render)(&ctx)?;

        Ok(ReadResourceResult {
            contents: vec![ResourceContents::TextResourceContents {
                uri: uri.to_string(),
                mime_type: entry.resource.raw.mime_type.clone(),
                text,
                meta: None,
            }],
        })
    }
}
