//! Three-phase conversion of a source tree into a destination tree.
//!
//! # Phases
//!
//! ```text
//! run()
//!     │
//!     ├── pre-build   every PreBuildHook sees the full source tree
//!     │               (no destination node exists yet)
//!     │
//!     ├── build       preorder over the source leaves:
//!     │                 load text ─► Preprocessors ─► Renderer ─► write file
//!     │                 └─► destination node with a ConvertedDoc payload
//!     │
//!     └── post-build  every PostBuildHook sees the finished destination
//!                     tree and may render synthetic documents into it
//! ```
//!
//! Every hook call and every leaf is guarded on its own. With
//! `abort_on_error` the first failure ends the run; otherwise it is logged,
//! recorded in the [`BuildReport`] and the next unit of work starts.

mod error;
mod render;
mod report;

pub use error::{BuildError, Phase};
pub use render::{
    ConversionOutcome, ConvertedDoc, DestHint, RenderOutput, Renderer, Severity, SourceDoc,
    dest_relative_path,
};
pub use report::BuildReport;

use crate::{
    log,
    tree::{NodeId, PathTree, TreeError},
};
use anyhow::{Context, Result};
use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

/// Source side: scanned leaves carry no payload, synthetic ones carry their text.
pub type SourceTree = PathTree<SourceDoc>;

/// Destination side: one [`ConvertedDoc`] per rendered leaf.
pub type DestTree = PathTree<ConvertedDoc>;

// ============================================================================
// Hook traits
// ============================================================================

/// What a pre-build hook gets to see.
pub struct PreBuildContext<'a> {
    pub src_tree: &'a SourceTree,
    /// Node of the source directory; leaves below it are the documents.
    pub src_top: NodeId,
    pub dest_root: &'a Path,
    pub report: &'a mut BuildReport,
}

/// The document currently going through the build phase.
pub struct DocContext<'a> {
    pub src_tree: &'a SourceTree,
    pub src_top: NodeId,
    pub src_node: NodeId,
    /// Destination path of this document relative to the destination root.
    pub dest_relative: &'a Path,
    /// Extension the renderer gives every output file.
    pub extension: &'a str,
    pub report: &'a mut BuildReport,
}

/// What a post-build hook gets to see.
pub struct PostBuildContext<'a> {
    pub src_tree: &'a SourceTree,
    pub src_top: NodeId,
    pub dest_tree: &'a mut DestTree,
    /// Node of the destination directory.
    pub dest_top: NodeId,
    pub dest_root: &'a Path,
    pub renderer: &'a dyn Renderer,
    pub report: &'a mut BuildReport,
}

pub trait PreBuildHook {
    fn name(&self) -> &str;
    fn run(&mut self, ctx: &mut PreBuildContext<'_>) -> Result<()>;
}

/// Rewrites document text after it is loaded and before the renderer runs.
pub trait Preprocessor {
    fn name(&self) -> &str;
    fn process(&mut self, ctx: &mut DocContext<'_>, text: String) -> Result<String>;
}

pub trait PostBuildHook {
    fn name(&self) -> &str;
    fn run(&mut self, ctx: &mut PostBuildContext<'_>) -> Result<()>;
}

// ============================================================================
// Pipeline
// ============================================================================

/// Everything a finished run produced.
#[derive(Debug)]
pub struct BuildOutput {
    pub dest_tree: DestTree,
    pub dest_top: NodeId,
    pub report: BuildReport,
}

/// Ordered hooks around one renderer.
pub struct Pipeline {
    renderer: Box<dyn Renderer>,
    pre_build: Vec<Box<dyn PreBuildHook>>,
    preprocessors: Vec<Box<dyn Preprocessor>>,
    post_build: Vec<Box<dyn PostBuildHook>>,
    /// Attributes handed to the renderer with every document.
    attributes: BTreeMap<String, String>,
    abort_on_error: bool,
}

impl Pipeline {
    pub fn new(renderer: Box<dyn Renderer>) -> Self {
        Self {
            renderer,
            pre_build: Vec::new(),
            preprocessors: Vec::new(),
            post_build: Vec::new(),
            attributes: BTreeMap::new(),
            abort_on_error: false,
        }
    }

    pub fn abort_on_error(mut self, abort: bool) -> Self {
        self.abort_on_error = abort;
        self
    }

    pub fn attributes(mut self, attributes: BTreeMap<String, String>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn add_pre_build(&mut self, hook: impl PreBuildHook + 'static) -> &mut Self {
        self.pre_build.push(Box::new(hook));
        self
    }

    pub fn add_preprocessor(&mut self, hook: impl Preprocessor + 'static) -> &mut Self {
        self.preprocessors.push(Box::new(hook));
        self
    }

    pub fn add_post_build(&mut self, hook: impl PostBuildHook + 'static) -> &mut Self {
        self.post_build.push(Box::new(hook));
        self
    }

    /// Convert every leaf below `src_top` into a tree rooted at `dest_root`.
    pub fn run(&mut self, src_tree: &SourceTree, src_top: NodeId, dest_root: &Path) -> Result<BuildOutput, BuildError> {
        let mut report = BuildReport::default();
        let abort = self.abort_on_error;

        // ---- pre-build ------------------------------------------------------
        for hook in &mut self.pre_build {
            let mut ctx = PreBuildContext {
                src_tree,
                src_top,
                dest_root,
                report: &mut report,
            };
            let result = hook.run(&mut ctx);
            guard(abort, Phase::PreBuild, hook.name(), result, &mut report)?;
        }

        // ---- build ----------------------------------------------------------
        let (mut dest_tree, dest_top) = DestTree::new(dest_root, None)?;
        let leaves: Vec<NodeId> = src_tree
            .leaves(src_top)
            .into_iter()
            .filter(|&leaf| leaf != src_top)
            .collect();

        log!("build"; "converting {} documents with `{}`", leaves.len(), self.renderer.name());
        for leaf in leaves {
            let source = src_tree
                .relative_pathname(leaf, src_top)
                .unwrap_or_else(|| PathBuf::from(src_tree.name(leaf)));
            let dest_relative = dest_relative_path(&source, self.renderer.extension());
            if dest_taken(&dest_tree, dest_top, &dest_relative) {
                if abort {
                    return Err(TreeError::Collision(dest_root.join(&dest_relative)).into());
                }
                report.failed += 1;
                report.warn(
                    &source,
                    format!("destination `{}` already taken, not converted", dest_relative.display()),
                );
                continue;
            }
            let dest_node = dest_tree.add_descendants(dest_top, &dest_relative, None)?;

            let outcome = match self.convert_leaf(src_tree, src_top, leaf, &dest_relative, dest_root, &mut report) {
                Ok(outcome) => {
                    report.succeeded += 1;
                    outcome
                }
                Err(e) if abort => {
                    return Err(BuildError::Conversion {
                        path: source,
                        message: format!("{e:#}"),
                    });
                }
                Err(e) => {
                    log!("error"; "{}: {:#}", source.display(), e);
                    report.failed += 1;
                    ConversionOutcome::Failure {
                        error_message: format!("{e:#}"),
                    }
                }
            };
            dest_tree.set_data(dest_node, Some(Arc::new(ConvertedDoc { source, outcome })));
        }

        // ---- post-build -----------------------------------------------------
        let renderer = self.renderer.as_ref();
        for hook in &mut self.post_build {
            let mut ctx = PostBuildContext {
                src_tree,
                src_top,
                dest_tree: &mut dest_tree,
                dest_top,
                dest_root,
                renderer,
                report: &mut report,
            };
            let result = hook.run(&mut ctx);
            guard(abort, Phase::PostBuild, hook.name(), result, &mut report)?;
        }

        Ok(BuildOutput {
            dest_tree,
            dest_top,
            report,
        })
    }

    /// Load, preprocess, render and write one document.
    fn convert_leaf(
        &mut self,
        src_tree: &SourceTree,
        src_top: NodeId,
        leaf: NodeId,
        dest_relative: &Path,
        dest_root: &Path,
        report: &mut BuildReport,
    ) -> Result<ConversionOutcome> {
        let mut doc = load_source(src_tree, leaf)?;
        for (key, value) in &self.attributes {
            doc.attributes
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }

        let extension = self.renderer.extension();
        for pre in &mut self.preprocessors {
            let mut ctx = DocContext {
                src_tree,
                src_top,
                src_node: leaf,
                dest_relative,
                extension,
                report: &mut *report,
            };
            doc.text = pre
                .process(&mut ctx, std::mem::take(&mut doc.text))
                .with_context(|| format!("preprocessor `{}`", pre.name()))?;
        }

        let output = self.renderer.convert(
            &doc,
            &DestHint {
                relative_path: dest_relative,
            },
        )?;
        let rendered_path = write_output(dest_root, dest_relative, &output)?;

        Ok(ConversionOutcome::Success {
            title: output.title.unwrap_or_default(),
            rendered_path,
            diagnostics: output.severity,
        })
    }
}

/// Whether `dest_relative` would land on a node that already exists below
/// `dest_top`, or pass through a converted document as if it were a directory.
fn dest_taken(tree: &DestTree, dest_top: NodeId, dest_relative: &Path) -> bool {
    let segments: Vec<_> = dest_relative.iter().map(|s| s.to_string_lossy()).collect();
    let mut current = dest_top;
    for (i, segment) in segments.iter().enumerate() {
        let Some(next) = tree.child(current, segment) else {
            return false;
        };
        if i + 1 == segments.len() || tree.data(next).is_some() {
            return true;
        }
        current = next;
    }
    false
}

/// Apply the failure policy to one hook result.
fn guard(abort: bool, phase: Phase, hook: &str, result: Result<()>, report: &mut BuildReport) -> Result<(), BuildError> {
    match result {
        Ok(()) => Ok(()),
        Err(source) if abort => Err(BuildError::Hook {
            phase,
            hook: hook.to_owned(),
            source,
        }),
        Err(e) => {
            log!("error"; "{} hook `{}`: {:#}", phase, hook, e);
            report.hook_failures.push(format!("{hook}: {e:#}"));
            Ok(())
        }
    }
}

/// Source document for a node: its payload if it has one, the file otherwise.
pub fn load_source(tree: &SourceTree, id: NodeId) -> Result<SourceDoc> {
    if let Some(doc) = tree.data(id) {
        return Ok(SourceDoc::clone(doc));
    }
    let path = tree.pathname(id);
    let text = fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let mut doc = SourceDoc::new(text);
    if let Some(stem) = path.file_stem() {
        doc.attributes
            .insert("docname".into(), stem.to_string_lossy().into_owned());
    }
    Ok(doc)
}

/// Write rendered bytes below `dest_root`, creating directories as needed.
pub fn write_output(dest_root: &Path, dest_relative: &Path, output: &RenderOutput) -> Result<PathBuf> {
    let path = dest_root.join(dest_relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&path, &output.bytes).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

// ============================================================================
// Tests
// ============================================================================
