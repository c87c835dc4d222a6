//! Tool handler implementations.
//!
//! - `command` runs an external CLI described by a manifest
//! - `echo` and `http_request` are builtins, referenced from manifests by id

pub mod command;
pub mod echo;
pub mod http_request;

pub use command::{CommandSpec, CommandTool};
pub use echo::{EchoParams, EchoTool};
pub use http_request::{HttpRequestParams, HttpRequestTool};
