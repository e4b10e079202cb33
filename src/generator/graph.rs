//! Docid dependency graph.
//!
//! Writes a DOT digraph with one node per registered docid and one edge per
//! resolved reference:
//!
//! ```dot
//! digraph docids {
//!     "D-1" [label="D-1\na.adoc"];
//!     "D-2" [label="D-2\nsub/b.adoc"];
//!     "D-1" -> "D-2";
//! }
//! ```
//!
//! Documents without a docid that reference others appear under their
//! source path.

use crate::{
    log,
    pipeline::{PostBuildContext, PostBuildHook},
    tree::NodeId,
    xref::SharedIndex,
};
use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use std::{fmt::Write, fs, path::PathBuf};

pub struct GraphHook {
    index: SharedIndex,
    /// Output file relative to the destination root.
    path: PathBuf,
}

impl GraphHook {
    pub fn new(index: SharedIndex, path: impl Into<PathBuf>) -> Self {
        Self {
            index,
            path: path.into(),
        }
    }
}

impl PostBuildHook for GraphHook {
    fn name(&self) -> &str {
        "graph"
    }

    fn run(&mut self, ctx: &mut PostBuildContext<'_>) -> Result<()> {
        let dot = self.to_dot(ctx);
        let path = ctx.dest_root.join(&self.path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, dot).with_context(|| format!("Failed to write {}", path.display()))?;
        log!("graph"; "{}", self.path.display());
        Ok(())
    }
}

impl GraphHook {
    fn to_dot(&self, ctx: &PostBuildContext<'_>) -> String {
        let index = self.index.read();
        let source_of = |node: NodeId| {
            ctx.src_tree
                .relative_pathname(node, ctx.src_top)
                .unwrap_or_default()
                .display()
                .to_string()
        };

        let ids = index.ids();
        let id_of: FxHashMap<NodeId, &str> = ids.iter().map(|&(id, node)| (node, id)).collect();

        let mut dot = String::from("digraph docids {\n");
        for &(id, node) in &ids {
            writeln!(
                dot,
                "    \"{}\" [label=\"{}\\n{}\"];",
                escape(id),
                escape(id),
                escape(&source_of(node))
            )
            .ok();
        }
        for (&node, targets) in index.dependencies() {
            let from = match id_of.get(&node) {
                Some(id) => (*id).to_owned(),
                None => source_of(node),
            };
            for target in targets {
                writeln!(dot, "    \"{}\" -> \"{}\";", escape(&from), escape(target)).ok();
            }
        }
        dot.push_str("}\n");
        dot
    }
}

/// Escape a DOT double-quoted string.
fn escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}
