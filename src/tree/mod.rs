//! Path-addressed tree used for both the source and the destination side of a build.
//!
//! Every node holds one path segment. The full path of a node is the join of
//! the segments from the root down to it, so the tree doubles as a compact
//! in-memory model of a directory hierarchy.
//!
//! # Layout
//!
//! ```text
//! PathTree
//!   nodes: [ "/" , "docs" , "a.adoc" , "sub" , "c.adoc" ]
//!            │       │         ▲          ▲        ▲
//!            └─► 1 ──┴─► 2 ────┘  ──► 3 ──┴──► 4 ──┘
//! ```
//!
//! Nodes live in an arena and refer to each other by [`NodeId`]. Parents are
//! plain indices, so there is no ownership cycle. Payloads are `Arc<T>` handles
//! which lets [`PathTree::duplicate`] hand out a structurally separate tree
//! that still points at the very same payloads.

mod fs;
mod query;
mod traverse;

use std::{
    path::{Component, Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;

/// Index of a node inside its [`PathTree`].
///
/// Ids are only meaningful for the tree that handed them out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

/// Structural errors. A failing operation never leaves the tree half-modified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("path is empty")]
    EmptyPath,

    #[error("invalid path segment `{0}`")]
    InvalidSegment(String),

    #[error("cannot add absolute path `{0}` below a non-root node")]
    AbsoluteDescendant(PathBuf),

    #[error("cannot graft a tree rooted at absolute path `{0}`")]
    AbsoluteGraft(PathBuf),

    #[error("path `{path}` does not start at tree root `{root}`")]
    RootMismatch { root: String, path: PathBuf },

    #[error("path `{0}` already exists in the target tree")]
    Collision(PathBuf),
}

#[derive(Debug)]
struct Node<T> {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    data: Option<Arc<T>>,
}

/// An ordered tree of path segments with optional payloads.
#[derive(Debug)]
pub struct PathTree<T> {
    nodes: Vec<Node<T>>,
}

impl<T> PathTree<T> {
    /// Create a tree holding the segments of `path` as a single chain.
    ///
    /// The first segment becomes the root, `data` is attached to the last one.
    /// Returns the tree together with the id of that last node.
    pub fn new(path: impl AsRef<Path>, data: Option<Arc<T>>) -> Result<(Self, NodeId), TreeError> {
        let segments = split_segments(path.as_ref())?;
        let mut tree = Self {
            nodes: Vec::with_capacity(segments.len()),
        };
        let mut current = tree.push_node(segments[0].clone(), None);
        for segment in &segments[1..] {
            current = tree.push_node(segment.clone(), Some(current));
        }
        tree.nodes[current.0].data = data;
        Ok((tree, current))
    }

    /// The root node. Every tree has exactly one.
    #[inline]
    pub const fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Total number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    #[inline]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    #[inline]
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.nodes[id.0].children.is_empty()
    }

    #[inline]
    pub fn data(&self, id: NodeId) -> Option<&Arc<T>> {
        self.nodes[id.0].data.as_ref()
    }

    /// Replace the payload of a node. The node keeps its position.
    pub fn set_data(&mut self, id: NodeId, data: Option<Arc<T>>) {
        self.nodes[id.0].data = data;
    }

    /// Direct child of `id` with the given segment name.
    pub fn child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.children(id)
            .iter()
            .copied()
            .find(|&c| self.name(c) == name)
    }

    /// Full path of a node, from the root down.
    pub fn pathname(&self, id: NodeId) -> PathBuf {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(n) = current {
            segments.push(self.name(n));
            current = self.parent(n);
        }
        segments.iter().rev().collect()
    }

    /// Path of `id` relative to `ancestor`.
    ///
    /// Returns `None` if `ancestor` is not on the way from `id` up to the root.
    /// A node relative to itself is the empty path.
    pub fn relative_pathname(&self, id: NodeId, ancestor: NodeId) -> Option<PathBuf> {
        let mut segments = Vec::new();
        let mut current = id;
        while current != ancestor {
            segments.push(self.name(current));
            current = self.parent(current)?;
        }
        Some(segments.iter().rev().collect())
    }

    /// Number of segments between the root and `id`.
    pub fn depth(&self, id: NodeId) -> usize {
        let mut depth = 0;
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            depth += 1;
            current = parent;
        }
        depth
    }

    /// Add `path` below `id`, creating any missing intermediate nodes.
    ///
    /// `data` is set on the final node, overwriting an existing payload.
    /// An absolute `path` is only accepted on the root, where it is handled
    /// like [`add_path`](Self::add_path).
    pub fn add_descendants(
        &mut self,
        id: NodeId,
        path: impl AsRef<Path>,
        data: Option<Arc<T>>,
    ) -> Result<NodeId, TreeError> {
        let path = path.as_ref();
        if path.has_root() {
            if id != self.root() {
                return Err(TreeError::AbsoluteDescendant(path.to_path_buf()));
            }
            return self.add_path(path, data);
        }
        let segments = split_segments(path)?;
        let leaf = self.grow(id, &segments);
        self.nodes[leaf.0].data = data;
        Ok(leaf)
    }

    /// Add a path that starts at the tree root, reusing any existing prefix.
    pub fn add_path(&mut self, path: impl AsRef<Path>, data: Option<Arc<T>>) -> Result<NodeId, TreeError> {
        let path = path.as_ref();
        let segments = split_segments(path)?;
        let root = self.root();
        if segments[0] != self.name(root) {
            return Err(TreeError::RootMismatch {
                root: self.name(root).to_owned(),
                path: path.to_path_buf(),
            });
        }
        let leaf = self.grow(root, &segments[1..]);
        self.nodes[leaf.0].data = data;
        Ok(leaf)
    }

    /// Exact path lookup.
    ///
    /// With `from_root`, `path` must start with the root segment and is
    /// resolved from there. Otherwise it is resolved relative to `from`.
    /// Each step scans the children of the current node; there is no index.
    pub fn node(&self, from: NodeId, path: impl AsRef<Path>, from_root: bool) -> Option<NodeId> {
        let segments = split_segments(path.as_ref()).ok()?;
        let (start, rest) = if from_root {
            let root = self.root();
            if segments[0] != self.name(root) {
                return None;
            }
            (root, &segments[1..])
        } else {
            (from, &segments[..])
        };

        rest.iter()
            .try_fold(start, |current, segment| self.child(current, segment))
    }

    /// Ids of all leaves below (or at) `id`, in preorder.
    pub fn leaves(&self, id: NodeId) -> Vec<NodeId> {
        self.traverse_preorder(id)
            .filter(|&(_, n)| self.is_leaf(n))
            .map(|(_, n)| n)
            .collect()
    }

    /// Paths of all leaves below `id`.
    ///
    /// With `prune` the paths are relative to `id`, otherwise they are full
    /// pathnames.
    pub fn leaf_pathnames(&self, id: NodeId, prune: bool) -> Vec<PathBuf> {
        self.leaves(id)
            .into_iter()
            .map(|leaf| {
                if prune {
                    self.relative_pathname(leaf, id).unwrap_or_default()
                } else {
                    self.pathname(leaf)
                }
            })
            .collect()
    }

    // ------------------------------------------------------------------------
    // Internal
    // ------------------------------------------------------------------------

    fn push_node(&mut self, name: String, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            name,
            parent,
            children: Vec::new(),
            data: None,
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        id
    }

    /// Walk `segments` below `from`, creating what is missing.
    fn grow(&mut self, from: NodeId, segments: &[String]) -> NodeId {
        segments.iter().fold(from, |current, segment| {
            match self.child(current, segment) {
                Some(existing) => existing,
                None => self.push_node(segment.clone(), Some(current)),
            }
        })
    }
}

/// Split a path into its segment names.
///
/// The root directory becomes the segment `/`; `.` and `..` are rejected since
/// they would break the one-node-per-segment model.
pub(crate) fn split_segments(path: &Path) -> Result<Vec<String>, TreeError> {
    // `Path::components` silently drops interior `.`, check the raw text too
    if path
        .to_string_lossy()
        .split(['/', '\\'])
        .any(|s| s == ".")
    {
        return Err(TreeError::InvalidSegment(".".into()));
    }

    let segments = path
        .components()
        .map(|c| match c {
            Component::RootDir => Ok("/".to_owned()),
            Component::Prefix(p) => Ok(p.as_os_str().to_string_lossy().into_owned()),
            Component::Normal(s) => Ok(s.to_string_lossy().into_owned()),
            Component::CurDir => Err(TreeError::InvalidSegment(".".into())),
            Component::ParentDir => Err(TreeError::InvalidSegment("..".into())),
        })
        .collect::<Result<Vec<_>, _>>()?;

    if segments.is_empty() {
        return Err(TreeError::EmptyPath);
    }
    Ok(segments)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PathTree<&'static str> {
        let (mut tree, _) = PathTree::new("/docs/a.adoc", Some(Arc::new("a"))).unwrap();
        tree.add_path("/docs/b.adoc", Some(Arc::new("b"))).unwrap();
        tree.add_path("/docs/sub/c.adoc", Some(Arc::new("c"))).unwrap();
        tree
    }

    #[test]
    fn test_new_builds_chain() {
        let (tree, leaf) = PathTree::<()>::new("x/y/z", None).unwrap();
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.name(tree.root()), "x");
        assert_eq!(tree.pathname(leaf), PathBuf::from("x/y/z"));
        assert!(tree.is_leaf(leaf));
    }

    #[test]
    fn test_new_rejects_bad_paths() {
        assert_eq!(PathTree::<()>::new("", None).unwrap_err(), TreeError::EmptyPath);
        assert!(matches!(
            PathTree::<()>::new("a/../b", None),
            Err(TreeError::InvalidSegment(_))
        ));
        assert!(matches!(
            PathTree::<()>::new("a/./b", None),
            Err(TreeError::InvalidSegment(_))
        ));
    }

    #[test]
    fn test_pathname_round_trip() {
        let tree = sample();
        for p in ["/docs/a.adoc", "/docs/b.adoc", "/docs/sub/c.adoc", "/docs/sub", "/"] {
            let id = tree.node(tree.root(), p, true).unwrap();
            assert_eq!(tree.pathname(id), PathBuf::from(p));
        }
    }

    #[test]
    fn test_add_path_reuses_prefix() {
        let tree = sample();
        // "/", "docs", "a.adoc", "b.adoc", "sub", "c.adoc"
        assert_eq!(tree.len(), 6);
        let docs = tree.node(tree.root(), "/docs", true).unwrap();
        assert_eq!(tree.children(docs).len(), 3);
    }

    #[test]
    fn test_add_path_root_mismatch() {
        let (mut tree, _) = PathTree::<()>::new("docs/a", None).unwrap();
        let err = tree.add_path("other/b", None).unwrap_err();
        assert!(matches!(err, TreeError::RootMismatch { .. }));
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_add_descendants_relative_to_node() {
        let mut tree = sample();
        let sub = tree.node(tree.root(), "/docs/sub", true).unwrap();
        let leaf = tree.add_descendants(sub, "deep/d.adoc", Some(Arc::new("d"))).unwrap();
        assert_eq!(tree.pathname(leaf), PathBuf::from("/docs/sub/deep/d.adoc"));
        assert_eq!(**tree.data(leaf).unwrap(), "d");
        // intermediate has no payload
        let deep = tree.parent(leaf).unwrap();
        assert!(tree.data(deep).is_none());
    }

    #[test]
    fn test_add_descendants_rejects_absolute_below_non_root() {
        let mut tree = sample();
        let docs = tree.node(tree.root(), "/docs", true).unwrap();
        let before = tree.len();
        let err = tree.add_descendants(docs, "/etc/passwd", None).unwrap_err();
        assert!(matches!(err, TreeError::AbsoluteDescendant(_)));
        assert_eq!(tree.len(), before);
    }

    #[test]
    fn test_add_descendants_absolute_on_root() {
        let mut tree = sample();
        let root = tree.root();
        let id = tree.add_descendants(root, "/docs/e.adoc", None).unwrap();
        assert_eq!(tree.pathname(id), PathBuf::from("/docs/e.adoc"));
    }

    #[test]
    fn test_add_descendants_overwrites_data() {
        let mut tree = sample();
        let docs = tree.node(tree.root(), "/docs", true).unwrap();
        let a = tree.add_descendants(docs, "a.adoc", Some(Arc::new("A"))).unwrap();
        assert_eq!(**tree.data(a).unwrap(), "A");
        assert_eq!(tree.len(), 6);
    }

    #[test]
    fn test_node_relative_lookup() {
        let tree = sample();
        let docs = tree.node(tree.root(), "/docs", true).unwrap();
        let c = tree.node(docs, "sub/c.adoc", false).unwrap();
        assert_eq!(tree.name(c), "c.adoc");
        assert!(tree.node(docs, "sub/missing", false).is_none());
        assert!(tree.node(docs, "docs/sub", true).is_none());
    }

    #[test]
    fn test_relative_pathname() {
        let tree = sample();
        let docs = tree.node(tree.root(), "/docs", true).unwrap();
        let c = tree.node(docs, "sub/c.adoc", false).unwrap();
        assert_eq!(tree.relative_pathname(c, docs), Some(PathBuf::from("sub/c.adoc")));
        assert_eq!(tree.relative_pathname(docs, docs), Some(PathBuf::new()));
        assert_eq!(tree.relative_pathname(docs, c), None);
        assert_eq!(tree.depth(c), 3);
    }

    #[test]
    fn test_leaf_pathnames() {
        let tree = sample();
        let docs = tree.node(tree.root(), "/docs", true).unwrap();
        assert_eq!(
            tree.leaf_pathnames(docs, true),
            vec![
                PathBuf::from("a.adoc"),
                PathBuf::from("b.adoc"),
                PathBuf::from("sub/c.adoc")
            ]
        );
        assert_eq!(tree.leaf_pathnames(docs, false)[0], PathBuf::from("/docs/a.adoc"));
    }
}
