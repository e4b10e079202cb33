//! Project initialization.
//!
//! Writes a default `docweave.toml`, the source directory with one sample
//! document, and ignore files for the output directory.

use crate::{config::DocConfig, log};
use anyhow::{Context, Result, bail};
use std::{fs, path::Path};

/// Files to write ignore patterns to
const IGNORE_FILES: &[&str] = &[".gitignore", ".ignore"];

const SAMPLE_NAME: &str = "getting-started.adoc";

const SAMPLE_DOC: &str = "\
= Getting Started
:docid: START

Write documents below this directory.
Give a document a `:docid:` in its header and link to it from anywhere
with <<:docid:START,a docid reference>>.
";

/// Create a new project in the configured root
pub fn new_project(config: &DocConfig) -> Result<()> {
    let root = config.get_root();
    fs::create_dir_all(root).with_context(|| format!("Failed to create {}", root.display()))?;

    init_source_dir(&config.build.source)?;
    init_default_config(&config.config_path)?;

    let output = config
        .build
        .output
        .strip_prefix(root)
        .unwrap_or(config.build.output.as_path());
    init_ignored_files(root, &[output])?;

    log!("init"; "created {}", config.config_path.display());
    Ok(())
}

/// Write default configuration file
fn init_default_config(path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(&DocConfig::default())?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Create the source directory with a sample document
fn init_source_dir(source: &Path) -> Result<()> {
    if source.exists() {
        bail!(
            "Path `{}` already exists. Remove it or init in a different root.",
            source.display()
        );
    }
    fs::create_dir_all(source).with_context(|| format!("Failed to create {}", source.display()))?;
    fs::write(source.join(SAMPLE_NAME), SAMPLE_DOC)?;
    Ok(())
}

/// Initialize .gitignore and .ignore files with specified paths
fn init_ignored_files(root: &Path, paths: &[&Path]) -> Result<()> {
    let content = paths
        .iter()
        .filter_map(|p| p.to_str())
        .collect::<Vec<_>>()
        .join("\n");

    for filename in IGNORE_FILES {
        let path = root.join(filename);
        if !path.exists() {
            fs::write(&path, &content)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn init_config(root: &Path) -> DocConfig {
        let cli: &'static Cli = Box::leak(Box::new(Cli {
            root: Some(root.to_path_buf()),
            config: PathBuf::from("docweave.toml"),
            command: Commands::Init,
        }));
        let mut config = DocConfig::default();
        config.update_with_cli(cli);
        config
    }

    #[test]
    fn test_new_project_layout() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("manual");
        let config = init_config(&root);
        new_project(&config).unwrap();

        let written = DocConfig::from_path(&root.join("docweave.toml")).unwrap();
        assert_eq!(written.build.source, PathBuf::from("docs"));
        assert!(written.xref.enable);

        let sample = fs::read_to_string(root.join("docs").join(SAMPLE_NAME)).unwrap();
        assert_eq!(crate::xref::header::find_docid(&sample), Some("START"));
        assert_eq!(fs::read_to_string(root.join(".gitignore")).unwrap(), "public");
    }

    #[test]
    fn test_existing_source_rejected() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("docs")).unwrap();
        let config = init_config(dir.path());
        assert!(new_project(&config).is_err());
    }

    #[test]
    fn test_ignore_files_not_overwritten() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".gitignore"), "target").unwrap();
        init_ignored_files(dir.path(), &[Path::new("public")]).unwrap();

        assert_eq!(fs::read_to_string(dir.path().join(".gitignore")).unwrap(), "target");
        assert_eq!(fs::read_to_string(dir.path().join(".ignore")).unwrap(), "public");
    }
}
