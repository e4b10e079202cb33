//! Project configuration management for `docweave.toml`.
//!
//! # Sections
//!
//! | Section     | Purpose                                           |
//! |-------------|---------------------------------------------------|
//! | `[build]`   | Source/output paths, selection, renderer          |
//! | `[xref]`    | Docid cross references                            |
//! | `[index]`   | Generated per-directory index documents           |
//! | `[graph]`   | Docid dependency graph (DOT)                      |
//! | `[assets]`  | Verbatim copy of non-document files               |
//!
//! # Example
//!
//! ```toml
//! [build]
//! source = "docs"
//! output = "public"
//!
//! [build.renderer]
//! kind = "html"
//!
//! [graph]
//! enable = true
//! ```

mod build;
pub mod defaults;
mod error;
mod hooks;

pub use build::{BuildConfig, RendererConfig, RendererKind};
pub use error::ConfigError;
pub use hooks::{AssetsConfig, GraphConfig, IndexConfig, XrefConfig};

use crate::cli::Cli;
use anyhow::{Context, Result, bail};
use educe::Educe;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Component, Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing docweave.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct DocConfig {
    /// CLI arguments reference
    #[serde(skip)]
    pub cli: Option<&'static Cli>,

    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    #[serde(default)]
    pub build: BuildConfig,

    #[serde(default)]
    pub xref: XrefConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub graph: GraphConfig,

    #[serde(default)]
    pub assets: AssetsConfig,
}

impl DocConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: DocConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        Self::from_str(&content).with_context(|| format!("in `{}`", path.display()))
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf())
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &'static Cli) {
        self.cli = Some(cli);

        if let Some(args) = cli.build_args() {
            Self::update_option(&mut self.build.source, args.source.as_ref());
            Self::update_option(&mut self.build.output, args.output.as_ref());
            Self::update_option(&mut self.build.abort_on_error, args.abort_on_error.as_ref());
            Self::update_option(&mut self.build.renderer.kind, args.renderer.as_ref());
            Self::update_option(&mut self.index.enable, args.index.as_ref());
            Self::update_option(&mut self.graph.enable, args.graph.as_ref());
            self.build.clean |= args.clean;
            self.build
                .attributes
                .extend(args.attributes.iter().cloned());
        }

        let root = cli
            .root
            .clone()
            .unwrap_or_else(|| self.get_root().to_owned());
        self.update_path_with_root(&root, &cli.config);
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Resolve all paths against the root and normalize to absolute paths
    fn update_path_with_root(&mut self, root: &Path, config: &Path) {
        let root = Self::normalize_path(&Self::expand_tilde(root));
        self.set_root(&root);

        self.config_path = Self::normalize_path(&root.join(config));
        self.build.source = Self::normalize_path(&root.join(Self::expand_tilde(&self.build.source)));
        self.build.output = Self::normalize_path(&root.join(Self::expand_tilde(&self.build.output)));
    }

    /// Expand a leading `~` to the home directory
    fn expand_tilde(path: &Path) -> PathBuf {
        match path.to_str() {
            Some(raw) => PathBuf::from(shellexpand::tilde(raw).into_owned()),
            None => path.to_path_buf(),
        }
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Compiled `[build.include]` pattern, if any
    pub fn include_regex(&self) -> Result<Option<Regex>, ConfigError> {
        Self::compile("[build.include]", self.build.include.as_deref())
    }

    /// Compiled `[build.exclude]` pattern, if any
    pub fn exclude_regex(&self) -> Result<Option<Regex>, ConfigError> {
        Self::compile("[build.exclude]", self.build.exclude.as_deref())
    }

    fn compile(field: &'static str, pattern: Option<&str>) -> Result<Option<Regex>, ConfigError> {
        pattern
            .map(Regex::new)
            .transpose()
            .map_err(|source| ConfigError::Regex { field, source })
    }

    /// Validate configuration before a build
    pub fn validate(&self) -> Result<()> {
        if !self.build.source.is_dir() {
            bail!(ConfigError::Validation(format!(
                "[build.source] `{}` is not a directory",
                self.build.source.display()
            )));
        }

        if self.build.output.starts_with(&self.build.source) {
            bail!(ConfigError::Validation(
                "[build.output] must not be inside [build.source]".into()
            ));
        }

        if self.build.extensions.is_empty() {
            bail!(ConfigError::Validation(
                "[build.extensions] must have at least one element".into()
            ));
        }

        let extension = self.build.renderer.output_extension();
        if extension.is_empty() || extension.contains(['/', '\\']) {
            bail!(ConfigError::Validation(format!(
                "[build.renderer.extension] `{extension}` is not a file extension"
            )));
        }

        if self.index.name.is_empty() || self.index.name.contains(['/', '\\']) {
            bail!(ConfigError::Validation(
                "[index.name] must be a plain file stem".into()
            ));
        }

        if self.graph.enable
            && (self.graph.path.is_absolute()
                || self.graph.path.components().any(|c| c == Component::ParentDir))
        {
            bail!(ConfigError::Validation(
                "[graph.path] must stay inside [build.output]".into()
            ));
        }

        self.include_regex()?;
        self.exclude_regex()?;

        if self.build.renderer.kind == RendererKind::Command {
            Self::check_command_installed("[build.renderer.command]", &self.build.renderer.command)?;
        }

        Ok(())
    }

    /// Check if a command is installed and available
    fn check_command_installed(field: &str, command: &[String]) -> Result<()> {
        let Some(cmd) = command.first() else {
            bail!(ConfigError::Validation(format!(
                "{field} must have at least one element"
            )));
        };

        which::which(cmd)
            .with_context(|| format!("`{cmd}` not found. Please install it first."))?;

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
