//! Cross-document references by docid.
//!
//! A document declares a stable id in its header (`:docid: D-1`) and other
//! documents point at it with `<<:docid:D-1#section,text>>`. Resolution needs
//! two passes because a reference may point at a document that comes later in
//! the traversal:
//!
//! ```text
//! pre-build   DocIdCollector   every header ─► XrefIndex (id → node), sealed
//! build       DocIdResolver    every line   ─► <<rel/path.html#section,text>>
//!                                              + dependency record
//! post-build  (graph hook)     XrefIndex    ─► dependency digraph
//! ```
//!
//! The index is shared between the hooks through [`SharedIndex`].

mod collect;
pub mod header;
mod resolve;

pub use collect::DocIdCollector;
pub use resolve::{DocIdResolver, UNRESOLVED_MARKER};

use crate::{pipeline::Pipeline, tree::NodeId};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
};

/// Handle to the run-scoped index, cloned into every hook that needs it.
pub type SharedIndex = Arc<RwLock<XrefIndex>>;

/// Docid registry plus the references each document made.
#[derive(Debug, Default)]
pub struct XrefIndex {
    ids: FxHashMap<String, NodeId>,
    dependencies: BTreeMap<NodeId, BTreeSet<String>>,
    /// Set once every header has been scanned.
    sealed: bool,
}

impl XrefIndex {
    /// Forget everything from a previous run.
    pub fn clear(&mut self) {
        self.ids.clear();
        self.dependencies.clear();
        self.sealed = false;
    }

    /// Register `id` for `node`, returning the node that held it before.
    pub fn register(&mut self, id: &str, node: NodeId) -> Option<NodeId> {
        self.ids.insert(id.to_owned(), node)
    }

    pub fn lookup(&self, id: &str) -> Option<NodeId> {
        self.ids.get(id).copied()
    }

    pub fn record_dependency(&mut self, node: NodeId, id: &str) {
        self.dependencies
            .entry(node)
            .or_default()
            .insert(id.to_owned());
    }

    pub fn dependencies(&self) -> &BTreeMap<NodeId, BTreeSet<String>> {
        &self.dependencies
    }

    /// All registered ids, sorted.
    pub fn ids(&self) -> Vec<(&str, NodeId)> {
        let mut ids: Vec<_> = self.ids.iter().map(|(k, &v)| (k.as_str(), v)).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub const fn is_sealed(&self) -> bool {
        self.sealed
    }
}

/// Add both resolver passes to `pipeline` and return their shared index.
pub fn install(pipeline: &mut Pipeline) -> SharedIndex {
    let index = SharedIndex::default();
    pipeline
        .add_pre_build(DocIdCollector::new(index.clone()))
        .add_preprocessor(DocIdResolver::new(index.clone()));
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{
        ConversionOutcome, DestHint, RenderOutput, Renderer, SourceDoc, SourceTree,
    };
    use anyhow::Result;
    use std::{fs, path::Path};
    use tempfile::TempDir;

    struct Plain;

    impl Renderer for Plain {
        fn name(&self) -> &str {
            "plain"
        }

        fn extension(&self) -> &str {
            "html"
        }

        fn convert(&self, source: &SourceDoc, _: &DestHint<'_>) -> Result<RenderOutput> {
            Ok(RenderOutput {
                bytes: source.text.clone().into_bytes(),
                ..Default::default()
            })
        }
    }

    fn write_docs(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (path, text) in files {
            let path = dir.path().join(path);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, text).unwrap();
        }
        dir
    }

    fn build(src: &Path, out: &Path) -> (SourceTree, NodeId, SharedIndex, crate::pipeline::BuildOutput) {
        let (tree, top) = SourceTree::from_dir(src, |_| true).unwrap();
        let mut pipeline = Pipeline::new(Box::new(Plain));
        let index = install(&mut pipeline);
        let output = pipeline.run(&tree, top, out).unwrap();
        (tree, top, index, output)
    }

    #[test]
    fn test_mutual_references() {
        let src = write_docs(&[
            ("a.adoc", "= A\n:docid: D-1\n\nSee <<:docid:D-2>>.\n"),
            ("sub/b.adoc", "= B\n:docid: D-2\n\nBack to <<:docid:D-1#intro,the start>>.\n"),
        ]);
        let out = TempDir::new().unwrap();
        let (tree, top, index, output) = build(src.path(), out.path());

        let a_text = fs::read_to_string(out.path().join("a.html")).unwrap();
        let b_text = fs::read_to_string(out.path().join("sub/b.html")).unwrap();
        assert!(a_text.contains("See <<sub/b.html,D-2>>."), "{a_text}");
        assert!(b_text.contains("Back to <<../a.html#intro,the start>>."), "{b_text}");

        let a = tree.node(top, "a.adoc", false).unwrap();
        let b = tree.node(top, "sub/b.adoc", false).unwrap();
        let index = index.read();
        let expected = BTreeMap::from([
            (a, BTreeSet::from(["D-2".to_owned()])),
            (b, BTreeSet::from(["D-1".to_owned()])),
        ]);
        assert_eq!(index.dependencies(), &expected);
        assert!(output.report.warnings.is_empty());
    }

    #[test]
    fn test_unknown_target_is_soft() {
        let src = write_docs(&[("a.adoc", "= A\n\nSee <<:docid:D-999>> here.\n")]);
        let out = TempDir::new().unwrap();
        let (_, _, index, output) = build(src.path(), out.path());

        let text = fs::read_to_string(out.path().join("a.html")).unwrap();
        assert!(text.contains(&format!("{UNRESOLVED_MARKER}D-999]")), "{text}");
        assert_eq!(output.report.succeeded, 1);
        assert_eq!(output.report.failed, 0);
        assert_eq!(output.report.warnings_matching("unresolved docid").count(), 1);
        assert!(index.read().dependencies().is_empty());

        let dest = output.dest_tree.node(output.dest_top, "a.html", false).unwrap();
        assert!(matches!(
            output.dest_tree.data(dest).unwrap().outcome,
            ConversionOutcome::Success { .. }
        ));
    }

    #[test]
    fn test_duplicate_id_last_wins() {
        let src = write_docs(&[
            ("a.adoc", "= A\n:docid: D-1\n"),
            ("b.adoc", "= B\n:docid: D-1\n"),
        ]);
        let out = TempDir::new().unwrap();
        let (tree, top, index, output) = build(src.path(), out.path());

        let b = tree.node(top, "b.adoc", false).unwrap();
        assert_eq!(index.read().lookup("D-1"), Some(b));
        assert_eq!(output.report.warnings.len(), 1);
        assert_eq!(output.report.warnings_matching("duplicate docid").count(), 1);
    }

    #[test]
    fn test_invalid_id_is_ignored() {
        let src = write_docs(&[
            ("a.adoc", "= A\n:docid: X\n"),
            ("b.adoc", "= B\n:docid: D#2\n"),
        ]);
        let out = TempDir::new().unwrap();
        let (_, _, index, output) = build(src.path(), out.path());

        assert_eq!(index.read().len(), 0);
        assert_eq!(output.report.warnings_matching("invalid docid").count(), 2);
        assert_eq!(output.report.succeeded, 2);
    }

    #[test]
    fn test_index_clear() {
        let mut index = XrefIndex::default();
        let (tree, leaf) = SourceTree::new("a/b", None).unwrap();
        assert_eq!(index.register("D-1", leaf), None);
        assert_eq!(index.register("D-1", tree.root()), Some(leaf));
        index.record_dependency(leaf, "D-1");
        index.seal();
        index.clear();
        assert_eq!(index.len(), 0);
        assert!(index.dependencies().is_empty());
        assert!(!index.is_sealed());
    }
}
