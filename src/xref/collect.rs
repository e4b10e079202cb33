use super::{
    SharedIndex,
    header::{find_docid, validate_docid},
};
use crate::pipeline::{PreBuildContext, PreBuildHook, load_source};
use anyhow::Result;

/// First pass: register the docid of every source document.
pub struct DocIdCollector {
    index: SharedIndex,
}

impl DocIdCollector {
    pub fn new(index: SharedIndex) -> Self {
        Self { index }
    }
}

impl PreBuildHook for DocIdCollector {
    fn name(&self) -> &str {
        "docid-collect"
    }

    fn run(&mut self, ctx: &mut PreBuildContext<'_>) -> Result<()> {
        let mut index = self.index.write();
        index.clear();

        for leaf in ctx.src_tree.leaves(ctx.src_top) {
            if leaf == ctx.src_top {
                continue;
            }
            let path = ctx
                .src_tree
                .relative_pathname(leaf, ctx.src_top)
                .unwrap_or_default();

            // unreadable files fail later, in the build phase
            let Ok(doc) = load_source(ctx.src_tree, leaf) else {
                continue;
            };
            let Some(id) = find_docid(&doc.text) else {
                continue;
            };

            if let Err(reason) = validate_docid(id) {
                ctx.report
                    .warn(&path, format!("invalid docid `{id}` ({reason}), ignored"));
                continue;
            }

            if let Some(previous) = index.register(id, leaf) {
                let previous = ctx
                    .src_tree
                    .relative_pathname(previous, ctx.src_top)
                    .unwrap_or_default();
                ctx.report.warn(
                    &path,
                    format!(
                        "duplicate docid `{id}` (also in {}), this document wins",
                        previous.display()
                    ),
                );
            }
        }

        index.seal();
        Ok(())
    }
}
