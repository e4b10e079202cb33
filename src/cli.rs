//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use crate::config::RendererKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// docweave documentation generator CLI
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Config file name, relative to root (default: docweave.toml)
    #[arg(short = 'C', long, default_value = "docweave.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Overrides for the `[build]` and hook sections
#[derive(clap::Args, Debug, Clone, Default)]
pub struct BuildArgs {
    /// Source directory (relative to project root)
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// Output directory (relative to project root)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Remove the output directory before building
    #[arg(long)]
    pub clean: bool,

    /// Stop at the first failing document or hook
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub abort_on_error: Option<bool>,

    /// Renderer used for every document
    #[arg(long, value_enum)]
    pub renderer: Option<RendererKind>,

    /// Generate one index document per output directory
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub index: Option<bool>,

    /// Write the docid dependency graph
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub graph: Option<bool>,

    /// Extra document attribute, may be repeated: `-a toc=left`
    #[arg(short = 'a', long = "attribute", value_parser = parse_attribute)]
    pub attributes: Vec<(String, String)>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Write a default config file and an empty source directory
    Init,

    /// Convert the source tree into the output directory
    Build {
        #[command(flatten)]
        build_args: BuildArgs,
    },
}

impl Cli {
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Commands::Init)
    }

    /// Build overrides, if the command carries any.
    pub fn build_args(&self) -> Option<&BuildArgs> {
        match &self.command {
            Commands::Build { build_args } => Some(build_args),
            Commands::Init => None,
        }
    }
}

/// Parse `key=value`; a bare `key` sets an empty value.
fn parse_attribute(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw.split_once('=').unwrap_or((raw, ""));
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("attribute `{raw}` has no name"));
    }
    Ok((key.to_owned(), value.trim().to_owned()))
}
