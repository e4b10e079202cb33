//! `[xref]`, `[index]`, `[graph]` and `[assets]` sections.
//!
//! Each section switches one optional hook of the pipeline.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[xref]` section - docid cross references.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct XrefConfig {
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,
}

/// `[index]` section - one index document per output directory.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct IndexConfig {
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    /// File stem of generated index documents.
    #[serde(default = "defaults::index::name")]
    #[educe(Default = defaults::index::name())]
    pub name: String,
}

/// `[graph]` section - docid dependency graph in DOT format.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct GraphConfig {
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub enable: bool,

    /// Output path, relative to the output directory.
    #[serde(default = "defaults::graph::path")]
    #[educe(Default = defaults::graph::path())]
    pub path: PathBuf,
}

/// `[assets]` section - copy non-document files next to the output.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct AssetsConfig {
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,

    /// File extensions (without dot) copied verbatim.
    #[serde(default = "defaults::assets::extensions")]
    #[educe(Default = defaults::assets::extensions())]
    pub extensions: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::super::DocConfig;
    use std::path::PathBuf;

    #[test]
    fn test_hook_sections_defaults() {
        let config: DocConfig = toml::from_str("").unwrap();
        assert!(config.xref.enable);
        assert!(config.index.enable);
        assert_eq!(config.index.name, "index");
        assert!(!config.graph.enable);
        assert_eq!(config.graph.path, PathBuf::from("docdeps.dot"));
        assert!(config.assets.extensions.contains(&"png".to_owned()));
    }

    #[test]
    fn test_hook_sections_custom() {
        let config: DocConfig = toml::from_str(
            r#"
            [xref]
            enable = false

            [index]
            name = "contents"

            [graph]
            enable = true
            path = "deps/graph.dot"

            [assets]
            extensions = ["pdf"]
        "#,
        )
        .unwrap();

        assert!(!config.xref.enable);
        assert_eq!(config.index.name, "contents");
        assert!(config.graph.enable);
        assert_eq!(config.graph.path, PathBuf::from("deps/graph.dot"));
        assert_eq!(config.assets.extensions, ["pdf"]);
    }

    #[test]
    fn test_unknown_field_in_section_rejected() {
        let result: Result<DocConfig, _> = toml::from_str(
            r#"
            [graph]
            format = "svg"
        "#,
        );
        assert!(result.is_err());
    }
}
