//! Tool discovery.
//!
//! Walks a directory tree in lexicographic order and turns every manifest
//! file into either a loaded definition or a recorded failure. Nothing in
//! here registers anything; see `registry.rs` for that.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use super::definition::ToolDefinition;
use super::error::LoadError;
use super::handlers::HandlerCatalog;
use super::manifest::parse_manifest;

/// File extensions recognised as tool manifests.
pub const MODULE_EXTENSIONS: &[&str] = &["tool", "toml"];

/// Outcome of loading a single discovered file.
#[derive(Debug)]
pub enum Discovered {
    Loaded(ToolDefinition),
    Failed { path: PathBuf, error: LoadError },
}

/// Whether `path` looks like a tool manifest.
pub fn is_tool_module(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| MODULE_EXTENSIONS.contains(&ext))
}

/// Discover every manifest below `root`.
///
/// Results come back in walk order (directories and files sorted by name),
/// so the same tree always yields the same sequence. Only an unreadable
/// root is an error; everything else is reported per entry.
pub fn discover(root: &Path, catalog: &HandlerCatalog) -> Result<Vec<Discovered>, LoadError> {
    fs::read_dir(root).map_err(|source| LoadError::DirectoryRead {
        path: root.to_path_buf(),
        source,
    })?;

    let mut discovered = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e.path().unwrap_or(root).to_path_buf();
                discovered.push(Discovered::Failed {
                    path: path.clone(),
                    error: LoadError::DirectoryRead {
                        path,
                        source: e.into(),
                    },
                });
                continue;
            }
        };

        if !entry.file_type().is_file() || !is_tool_module(entry.path()) {
            continue;
        }

        debug!("Loading tool module {}", entry.path().display());
        discovered.push(load_module(entry.path(), catalog));
    }

    Ok(discovered)
}

/// Read and parse one manifest.
pub fn load_module(path: &Path, catalog: &HandlerCatalog) -> Discovered {
    let result = fs::read_to_string(path)
        .map_err(|e| LoadError::module_load(path, e))
        .and_then(|text| parse_manifest(path, &text, catalog));

    match result {
        Ok(definition) => Discovered::Loaded(definition),
        Err(error) => Discovered::Failed {
            path: path.to_path_buf(),
            error,
        },
    }
}
