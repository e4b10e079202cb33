//! Verbatim copy of non-document files.

use crate::{
    log,
    pipeline::{PostBuildContext, PostBuildHook},
    tree::PathTree,
};
use anyhow::{Context, Result};
use std::{fs, path::Path};

/// Copies files whose extension is listed from the source directory into
/// the destination directory, keeping relative paths.
///
/// Copied files become payload-less leaves of the destination tree.
pub struct AssetsHook {
    extensions: Vec<String>,
}

impl AssetsHook {
    pub fn new(extensions: Vec<String>) -> Self {
        Self { extensions }
    }

    fn is_asset(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext)))
    }
}

impl PostBuildHook for AssetsHook {
    fn name(&self) -> &str {
        "assets"
    }

    fn run(&mut self, ctx: &mut PostBuildContext<'_>) -> Result<()> {
        let src_dir = ctx.src_tree.pathname(ctx.src_top);
        let (assets, top) = PathTree::<()>::from_dir(&src_dir, |p| self.is_asset(p))?;

        let mut copied = 0;
        for leaf in assets.leaves(top) {
            if leaf == top {
                continue;
            }
            let Some(relative) = assets.relative_pathname(leaf, top) else {
                continue;
            };
            if ctx.dest_tree.node(ctx.dest_top, &relative, false).is_some() {
                ctx.report
                    .warn(&relative, "asset skipped, destination already exists");
                continue;
            }

            let dest = ctx.dest_root.join(&relative);
            if let Some(parent) = dest.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::copy(assets.pathname(leaf), &dest)
                .with_context(|| format!("Failed to copy {}", relative.display()))?;
            ctx.dest_tree.add_descendants(ctx.dest_top, &relative, None)?;
            copied += 1;
        }

        log!("assets"; "copied {} files", copied);
        Ok(())
    }
}
