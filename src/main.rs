//! docweave - a documentation tree generator with docid cross references.

mod build;
mod cli;
mod config;
mod generator;
mod init;
mod logger;
mod pipeline;
mod renderer;
mod tree;
mod xref;

use anyhow::{Result, bail};
use build::build_docs;
use clap::Parser;
use cli::{Cli, Commands};
use config::DocConfig;
use init::new_project;
use std::path::Path;

fn main() -> Result<()> {
    let cli: &'static Cli = Box::leak(Box::new(Cli::parse()));
    let config: &'static DocConfig = Box::leak(Box::new(load_config(cli)?));

    match &cli.command {
        Commands::Init => new_project(config),
        Commands::Build { .. } => {
            // failed documents are reported, only fatal errors end the run
            let report = build_docs(config)?;
            logger::summary(report.is_clean(), &report.to_string());
            Ok(())
        }
    }
}

/// Load and validate configuration from CLI arguments
fn load_config(cli: &'static Cli) -> Result<DocConfig> {
    let root = cli.root.as_deref().unwrap_or(Path::new("./"));
    let config_path = root.join(&cli.config);

    let mut config = if config_path.exists() {
        DocConfig::from_path(&config_path)?
    } else {
        DocConfig::default()
    };
    config.update_with_cli(cli);

    let config_exists = config.config_path.exists();
    match (cli.is_init(), config_exists) {
        (true, true) => {
            bail!("Config file already exists. Remove it manually or init in a different root.")
        }
        (false, false) => bail!("Config file not found."),
        _ => {}
    }

    if !cli.is_init() {
        config.validate()?;
    }

    Ok(config)
}
