//! Resource definitions.
//!
//! One file per resource. Each renders its content on every read, so it
//! always reflects the registries the server is actually serving.

mod load_report;
mod tool_catalog;

pub use load_report::LoadReportResource;
pub use tool_catalog::ToolCatalogResource;

use super::error::ResourceError;
use super::service::CatalogContext;

/// Static metadata plus a renderer.
pub trait ResourceDefinition {
    /// The unique URI of the resource.
    const URI: &'static str;

    /// The display name of the resource.
    const NAME: &'static str;

    /// A description of the resource.
    const DESCRIPTION: &'static str;

    /// The MIME type of the resource content.
    const MIME_TYPE: &'static str;

    /// Render the content from the currently loaded tools.
    fn render(ctx: &CatalogContext<'_>) -> Result<String, ResourceError>;
}
