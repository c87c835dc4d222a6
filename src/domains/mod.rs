//! Domains module containing business logic organized by bounded contexts.
//!
//! - `tools` - manifest discovery, registration and validated calls
//! - `resources` - read-only catalog views over the loaded tools

pub mod resources;
pub mod tools;
