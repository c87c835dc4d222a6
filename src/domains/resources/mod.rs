//! Resources domain module.
//!
//! Read-only views of the loaded tool sources: a markdown catalog of every
//! registered tool and a JSON report of what each source loaded or skipped.
//!
//! ## Architecture
//!
//! - `definitions/` - Individual resource definitions (one file per resource)
//! - `registry.rs` - Central resource registration
//! - `service.rs` - Resource service for listing and reading
//!
//! New resources implement `ResourceDefinition` in `definitions/` and are
//! listed in `registry.rs`; `service.rs` does not change.

pub mod definitions;
mod error;
mod registry;
mod service;

pub use definitions::ResourceDefinition;
pub use error::ResourceError;
pub use registry::{get_all_resources, resource_uris};
pub use service::{CatalogContext, RenderFn, ResourceEntry, ResourceService, SourceReport};
