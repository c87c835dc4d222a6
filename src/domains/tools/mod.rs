//! Tools domain module.
//!
//! Tools are not compiled into the server. Each one is a TOML manifest in a
//! source directory, discovered at startup and registered under the
//! source's prefix.
//!
//! ## Architecture
//!
//! - `manifest.rs` - Manifest parsing and the tool-shape check
//! - `schema.rs` - Input schema model, call-time validation and coercion
//! - `handlers.rs` - `ToolHandler` trait and the builtin catalog
//! - `definitions/` - Handler implementations (command runner, builtins)
//! - `loader.rs` - Directory walk, one result per manifest
//! - `registry.rs` - Namespaced registry, load report, validated calls
//! - `router.rs` - Dynamic ToolRouter built from the registries
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! Drop a manifest into a source directory:
//!
//! ```toml
//! name = "ps"
//! description = "List running containers"
//! category = "docker"
//!
//! [handler]
//! kind = "command"
//! program = "docker"
//! args = ["ps", "--format", "{{json .}}"]
//! flags = { all = "--all" }
//!
//! [input_schema]
//! type = "object"
//! properties = { all = { type = "boolean", default = false } }
//! ```
//!
//! **No need to modify `server.rs`!** The router is built from whatever
//! was loaded.

pub mod definitions;
mod definition;
mod error;
mod handlers;
pub mod loader;
pub mod manifest;
mod registry;
pub mod router;
pub mod schema;

pub use definition::ToolDefinition;
pub use error::{LoadError, ToolError};
pub use handlers::{BuiltinEntry, HandlerCatalog, HandlerSpec, ToolHandler};
pub use registry::{LoadReport, RegisteredTool, SkippedModule, ToolRegistry, qualified_name};
pub use router::build_tool_router;
pub use schema::{FieldType, InputSchema, ValidationError};
