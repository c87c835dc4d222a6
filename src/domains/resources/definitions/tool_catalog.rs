//! Tool catalog resource definition.

use std::collections::{BTreeMap, HashSet};
use std::fmt::Write;

use super::ResourceDefinition;
use crate::domains::resources::error::ResourceError;
use crate::domains::resources::service::CatalogContext;
use crate::domains::tools::RegisteredTool;

const UNCATEGORIZED: &str = "uncategorized";

/// Markdown listing of every callable tool, grouped by category.
///
/// A tool whose qualified name an earlier source already owns is not
/// routed, so it is left out here too.
pub struct ToolCatalogResource;

impl ResourceDefinition for ToolCatalogResource {
    const URI: &'static str = "mcp://tools/catalog";
    const NAME: &'static str = "Tool Catalog";
    const DESCRIPTION: &'static str =
        "Every registered tool grouped by category and subcategory";
    const MIME_TYPE: &'static str = "text/markdown";

    fn render(ctx: &CatalogContext<'_>) -> Result<String, ResourceError> {
        // category -> subcategory -> tools
        let mut groups: BTreeMap<&str, BTreeMap<Option<&str>, Vec<&RegisteredTool>>> =
            BTreeMap::new();
        let mut listed = HashSet::new();

        for registry in ctx.registries {
            for (name, tool) in registry.get_all_tools() {
                if !listed.insert(name.as_str()) {
                    continue;
                }
                let def = tool.definition();
                groups
                    .entry(def.category.as_deref().unwrap_or(UNCATEGORIZED))
                    .or_default()
                    .entry(def.subcategory.as_deref())
                    .or_default()
                    .push(tool);
            }
        }

        let mut out = String::from("# Tool Catalog\n\n");
        let _ = writeln!(out, "{} tools registered.", listed.len());

        for (category, subcategories) in &groups {
            let _ = write!(out, "\n## {}\n", category);
            for (subcategory, tools) in subcategories {
                if let Some(subcategory) = subcategory {
                    let _ = write!(out, "\n### {}\n", subcategory);
                }
                out.push('\n');
                for tool in tools {
                    let def = tool.definition();
                    let _ = write!(out, "- `{}`", tool.qualified_name());
                    if let Some(version) = &def.version {
                        let _ = write!(out, " (v{})", version);
                    }
                    let _ = writeln!(out, ": {}", def.description);
                }
            }
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::definitions::EchoTool;
    use crate::domains::tools::{InputSchema, ToolDefinition, ToolRegistry};
    use std::sync::Arc;

    fn definition(name: &str, category: Option<&str>, subcategory: Option<&str>) -> ToolDefinition {
        let mut def = ToolDefinition::new(name, format!("{name} tool"), InputSchema::object(), Arc::new(EchoTool));
        def.category = category.map(str::to_string);
        def.subcategory = subcategory.map(str::to_string);
        def
    }

    #[test]
    fn test_tool_catalog_metadata() {
        assert_eq!(ToolCatalogResource::URI, "mcp://tools/catalog");
        assert_eq!(ToolCatalogResource::MIME_TYPE, "text/markdown");
    }

    #[test]
    fn test_catalog_groups_by_category() {
        let mut docker = ToolRegistry::new("docker");
        docker.register(definition("ps", Some("docker"), Some("containers"))).unwrap();
        let mut versioned = definition("images", Some("docker"), Some("images"));
        versioned.version = Some("1.2".to_string());
        docker.register(versioned).unwrap();

        let mut misc = ToolRegistry::new("");
        misc.register(definition("echo", None, None)).unwrap();

        let registries = vec![docker, misc];
        let text = ToolCatalogResource::render(&CatalogContext {
            registries: &registries,
            reports: &[],
        })
        .unwrap();

        assert!(text.contains("3 tools registered."));
        assert!(text.contains("## docker"));
        assert!(text.contains("### containers"));
        assert!(text.contains("- `docker_images` (v1.2): images tool"));
        assert!(text.contains("## uncategorized"));
        assert!(text.find("## docker").unwrap() < text.find("## uncategorized").unwrap());
    }

    #[test]
    fn test_catalog_omits_shadowed_tools() {
        let mut first = ToolRegistry::new("");
        first.register(definition("echo", Some("first"), None)).unwrap();
        let mut second = ToolRegistry::new("");
        second.register(definition("echo", Some("second"), None)).unwrap();

        let registries = vec![first, second];
        let text = ToolCatalogResource::render(&CatalogContext {
            registries: &registries,
            reports: &[],
        })
        .unwrap();

        assert!(text.contains("1 tools registered."));
        assert!(text.contains("## first"));
        assert!(!text.contains("## second"));
        assert_eq!(text.matches("- `echo`").count(), 1);
    }

    #[test]
    fn test_empty_catalog() {
        let text = ToolCatalogResource::render(&CatalogContext {
            registries: &[],
            reports: &[],
        })
        .unwrap();
        assert!(text.contains("0 tools registered."));
    }
}
