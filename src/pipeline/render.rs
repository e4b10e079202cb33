//! The renderer contract and the per-document conversion records.

use anyhow::Result;
use std::{
    collections::BTreeMap,
    fmt,
    path::{Path, PathBuf},
};

/// Input handed to a [`Renderer`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceDoc {
    pub text: String,
    pub attributes: BTreeMap<String, String>,
}

impl SourceDoc {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            attributes: BTreeMap::new(),
        }
    }
}

/// Where the rendered bytes will end up, relative to the destination root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestHint<'a> {
    pub relative_path: &'a Path,
}

/// Most severe diagnostic a renderer emitted for one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    #[default]
    None,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::None => "none",
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Successful renderer result.
#[derive(Debug, Clone, Default)]
pub struct RenderOutput {
    pub bytes: Vec<u8>,
    /// Document title, if the renderer found one.
    pub title: Option<String>,
    pub severity: Severity,
}

/// Turns source text into output bytes.
///
/// The pipeline knows nothing about markup; everything format specific lives
/// behind this trait.
pub trait Renderer {
    /// Short name used in log lines.
    fn name(&self) -> &str;

    /// Extension (without dot) of every file this renderer produces.
    ///
    /// Known up front because destination paths, and the relative links that
    /// point at them, are computed before a document is rendered.
    fn extension(&self) -> &str;

    fn convert(&self, source: &SourceDoc, dest: &DestHint<'_>) -> Result<RenderOutput>;
}

/// Result of converting one source leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversionOutcome {
    Success {
        title: String,
        rendered_path: PathBuf,
        diagnostics: Severity,
    },
    Failure {
        error_message: String,
    },
}

impl ConversionOutcome {
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Payload of a destination node: the outcome plus where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedDoc {
    /// Source path relative to the source top directory.
    pub source: PathBuf,
    pub outcome: ConversionOutcome,
}

impl ConvertedDoc {
    /// Title to show in listings, falling back to the source file stem.
    pub fn display_title(&self) -> String {
        match &self.outcome {
            ConversionOutcome::Success { title, .. } if !title.is_empty() => title.clone(),
            _ => self
                .source
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }
}

/// Replace the extension of a relative source path with the renderer's one.
pub fn dest_relative_path(source: &Path, extension: &str) -> PathBuf {
    source.with_extension(extension)
}
