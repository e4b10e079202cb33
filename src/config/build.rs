//! `[build]` section configuration.
//!
//! Contains the source/output locations, document selection, failure policy
//! and renderer settings.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::PathBuf};

// ============================================================================
// Enums
// ============================================================================

/// Which renderer turns documents into output files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RendererKind {
    /// Minimal HTML: titles, paragraphs and resolved links (default).
    #[default]
    Html,
    /// Copy text through unchanged.
    Text,
    /// Pipe the text through `[build.renderer.command]`.
    Command,
}

// ============================================================================
// Main BuildConfig
// ============================================================================

/// `[build]` section in docweave.toml.
///
/// # Example
/// ```toml
/// [build]
/// source = "docs"
/// output = "public"
/// extensions = ["adoc"]
/// exclude = "^drafts/"
/// abort_on_error = false
///
/// [build.renderer]
/// kind = "command"
/// command = ["asciidoctor", "-o", "-", "-"]
/// extension = "html"
///
/// [build.attributes]
/// toc = "left"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Directory holding the source documents.
    #[serde(default = "defaults::build::source")]
    #[educe(Default = defaults::build::source())]
    pub source: PathBuf,

    /// Directory receiving the rendered tree.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// File extensions (without dot) treated as documents.
    #[serde(default = "defaults::build::extensions")]
    #[educe(Default = defaults::build::extensions())]
    pub extensions: Vec<String>,

    /// Only documents whose relative path matches this regex are built.
    #[serde(default)]
    pub include: Option<String>,

    /// Documents whose relative path matches this regex are skipped.
    #[serde(default)]
    pub exclude: Option<String>,

    /// Stop at the first failing document or hook.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub abort_on_error: bool,

    /// Remove the output directory before building.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub clean: bool,

    /// Renderer selection.
    #[serde(default)]
    pub renderer: RendererConfig,

    /// Attributes handed to the renderer with every document.
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// `[build.renderer]` section
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct RendererConfig {
    #[serde(default = "defaults::build::renderer::kind")]
    #[educe(Default = defaults::build::renderer::kind())]
    pub kind: RendererKind,

    /// Program and arguments for `kind = "command"`; text goes to stdin.
    #[serde(default = "defaults::build::renderer::command")]
    #[educe(Default = defaults::build::renderer::command())]
    pub command: Vec<String>,

    /// Output extension; defaults to `html` for html/command and `txt` for text.
    #[serde(default = "defaults::build::renderer::extension")]
    #[educe(Default = defaults::build::renderer::extension())]
    pub extension: Option<String>,
}

impl RendererConfig {
    /// Extension used for rendered files.
    pub fn output_extension(&self) -> &str {
        match (&self.extension, self.kind) {
            (Some(ext), _) => ext.trim_start_matches('.'),
            (None, RendererKind::Text) => "txt",
            (None, _) => "html",
        }
    }
}
