// Security module for path validation
//
// Command-backed tools may run inside a caller-supplied directory. These
// helpers keep such directories inside the configured root.

pub mod path_validator;

pub use path_validator::{validate_directory, validate_path, PathSecurityError};
