//! Build orchestration.
//!
//! Turns a [`DocConfig`] into a pipeline run.
//!
//! # Architecture
//!
//! ```text
//! build_docs()
//!     │
//!     ├── scan_sources()     source dir ─► SourceTree (extension, include, exclude)
//!     │
//!     ├── assemble()         renderer + hooks selected by config
//!     │       │
//!     │       ├── [xref]     DocIdCollector (pre-build), DocIdResolver (preprocessor)
//!     │       ├── [index]    IndexHook  (post-build)
//!     │       ├── [assets]   AssetsHook (post-build)
//!     │       └── [graph]    GraphHook  (post-build)
//!     │
//!     └── Pipeline::run()    ─► BuildReport
//! ```

use crate::{
    config::DocConfig,
    generator::{AssetsHook, GraphHook, IndexHook},
    log,
    pipeline::{BuildReport, Pipeline, SourceTree},
    renderer, xref,
    tree::NodeId,
};
use anyhow::{Context, Result};
use std::{fs, path::Path};

/// Convert the configured source tree and return the run report.
///
/// Errors are fatal: structural problems, or any failure with
/// `[build.abort_on_error]` set.
pub fn build_docs(config: &DocConfig) -> Result<BuildReport> {
    let output = &config.build.output;

    if config.build.clean && output.exists() {
        log!("build"; "cleaning {}", output.display());
        fs::remove_dir_all(output)
            .with_context(|| format!("Failed to clean {}", output.display()))?;
    }
    fs::create_dir_all(output).with_context(|| format!("Failed to create {}", output.display()))?;

    let (src_tree, src_top) = scan_sources(config)?;
    log!(
        "build";
        "found {} documents in {}",
        src_tree.leaves(src_top).into_iter().filter(|&l| l != src_top).count(),
        config.build.source.display()
    );

    let mut pipeline = assemble(config);
    let result = pipeline.run(&src_tree, src_top, output)?;
    Ok(result.report)
}

/// Source tree of every document selected by `[build]`.
fn scan_sources(config: &DocConfig) -> Result<(SourceTree, NodeId)> {
    let include = config.include_regex()?;
    let exclude = config.exclude_regex()?;
    let extensions = &config.build.extensions;

    let accept = |relative: &Path| {
        let has_extension = relative
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.iter().any(|e| e.trim_start_matches('.') == ext));
        let text = relative.to_string_lossy().replace('\\', "/");
        has_extension
            && include.as_ref().is_none_or(|re| re.is_match(&text))
            && !exclude.as_ref().is_some_and(|re| re.is_match(&text))
    };

    let tree = SourceTree::from_dir(&config.build.source, accept)?;
    Ok(tree)
}

/// Renderer and hooks for this configuration, in execution order.
fn assemble(config: &DocConfig) -> Pipeline {
    let mut pipeline = Pipeline::new(renderer::from_config(&config.build.renderer))
        .abort_on_error(config.build.abort_on_error)
        .attributes(config.build.attributes.clone());

    let index = config.xref.enable.then(|| xref::install(&mut pipeline));

    if config.index.enable {
        pipeline.add_post_build(IndexHook::new(&config.index.name));
    }
    if config.assets.enable {
        pipeline.add_post_build(AssetsHook::new(config.assets.extensions.clone()));
    }
    if config.graph.enable {
        match index {
            Some(index) => {
                pipeline.add_post_build(GraphHook::new(index, &config.graph.path));
            }
            None => log!("warn"; "[graph] needs [xref] enabled, skipped"),
        }
    }

    pipeline
}
