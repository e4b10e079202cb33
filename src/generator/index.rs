//! Per-directory index documents.
//!
//! After the build every destination directory gets one synthetic document
//! listing its entries. Directories are visited children first, so a parent
//! can link to the index its subdirectories just received.
//!
//! ```text
//! = Index of guide
//!
//! * <<intro.html,Introduction>>
//! * setup.adoc (conversion failed)
//! * <<advanced/index.html,advanced/>>
//! ```
//!
//! The top index additionally carries the run summary, a listing of every
//! document below the shared stem, and a generation timestamp.

use crate::{
    log,
    pipeline::{
        ConversionOutcome, ConvertedDoc, DestHint, DestTree, PostBuildContext, PostBuildHook,
        SourceDoc, SourceTree, load_source, write_output,
    },
    tree::{NodeId, TreeError},
};
use anyhow::Result;
use std::{
    fmt::Write,
    path::{Path, PathBuf},
    sync::Arc,
};

pub struct IndexHook {
    /// File stem of every generated document.
    stem: String,
}

impl IndexHook {
    pub fn new(stem: impl Into<String>) -> Self {
        Self { stem: stem.into() }
    }
}

impl PostBuildHook for IndexHook {
    fn name(&self) -> &str {
        "index"
    }

    fn run(&mut self, ctx: &mut PostBuildContext<'_>) -> Result<()> {
        let file_name = format!("{}.{}", self.stem, ctx.renderer.extension());
        let top = ctx.dest_top;

        ctx.dest_tree.sort_leaf_first(top);
        let dirs: Vec<NodeId> = ctx
            .dest_tree
            .traverse_postorder(top)
            .map(|(_, id)| id)
            .filter(|&id| id == top || !ctx.dest_tree.is_leaf(id))
            .collect();

        let mut generated: Vec<NodeId> = Vec::new();
        for dir in dirs {
            let rel_dir = ctx.dest_tree.relative_pathname(dir, top).unwrap_or_default();
            let dest_relative = rel_dir.join(&file_name);

            let text = if dir == top {
                top_listing(ctx, &file_name, &generated)
            } else {
                listing(ctx.dest_tree, dir, &rel_dir, &file_name)
            };

            // Graft before writing so a real document with the same name is
            // never overwritten.
            let (page, _) = DestTree::new(&file_name, None)?;
            let node = match ctx.dest_tree.append_subtree(dir, &page) {
                Ok(node) => node,
                Err(TreeError::Collision(path)) => {
                    ctx.report.warn(
                        &dest_relative,
                        format!("index skipped, `{}` already exists", path.display()),
                    );
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let outcome = match render_page(ctx, &file_name, text, &dest_relative) {
                Ok(outcome) => outcome,
                Err(e) => {
                    ctx.dest_tree.set_data(
                        node,
                        Some(Arc::new(ConvertedDoc {
                            source: dest_relative.clone(),
                            outcome: ConversionOutcome::Failure {
                                error_message: format!("{e:#}"),
                            },
                        })),
                    );
                    return Err(e.context(format!("index {}", dest_relative.display())));
                }
            };
            ctx.dest_tree.set_data(
                node,
                Some(Arc::new(ConvertedDoc {
                    source: dest_relative,
                    outcome,
                })),
            );
            generated.push(node);
        }

        log!("index"; "wrote {} index documents", generated.len());
        Ok(())
    }
}

/// Render synthetic text through the pipeline's renderer and write it.
fn render_page(
    ctx: &PostBuildContext<'_>,
    file_name: &str,
    text: String,
    dest_relative: &Path,
) -> Result<ConversionOutcome> {
    let mut doc = SourceDoc::new(text);
    doc.attributes.insert("docname".into(), file_name.to_owned());
    let (synthetic, node) = SourceTree::new(file_name, Some(Arc::new(doc)))?;

    let doc = load_source(&synthetic, node)?;
    let output = ctx.renderer.convert(
        &doc,
        &DestHint {
            relative_path: dest_relative,
        },
    )?;
    let rendered_path = write_output(ctx.dest_root, dest_relative, &output)?;

    Ok(ConversionOutcome::Success {
        title: output.title.unwrap_or_default(),
        rendered_path,
        diagnostics: output.severity,
    })
}

/// Entries of one directory; the tree must already be sorted.
fn listing(tree: &DestTree, dir: NodeId, rel_dir: &Path, file_name: &str) -> String {
    let mut text = String::new();
    let heading = if rel_dir.as_os_str().is_empty() {
        "Index".to_owned()
    } else {
        format!("Index of {}", rel_dir.display())
    };
    writeln!(text, "= {heading}\n").ok();
    push_entries(tree, dir, file_name, &mut text);
    text
}

fn push_entries(tree: &DestTree, dir: NodeId, file_name: &str, text: &mut String) {
    for &child in tree.children(dir) {
        let name = tree.name(child);
        if tree.is_leaf(child) {
            // assets and other unconverted files carry no payload
            let Some(doc) = tree.data(child) else {
                continue;
            };
            match &doc.outcome {
                ConversionOutcome::Success { .. } => {
                    writeln!(text, "* <<{name},{}>>", doc.display_title()).ok();
                }
                ConversionOutcome::Failure { .. } => {
                    let source = doc.source.file_name().map_or(name.into(), |s| s.to_string_lossy());
                    writeln!(text, "* {source} (conversion failed)").ok();
                }
            }
        } else {
            let has_index = tree
                .child(child, file_name)
                .and_then(|index| tree.data(index))
                .is_some_and(|doc| doc.outcome.is_success());
            if has_index {
                writeln!(text, "* <<{name}/{file_name},{name}/>>").ok();
            } else {
                writeln!(text, "* {name}/").ok();
            }
        }
    }
}

/// Top directory: local entries, run summary and every converted document.
fn top_listing(ctx: &PostBuildContext<'_>, file_name: &str, generated: &[NodeId]) -> String {
    let tree = &*ctx.dest_tree;
    let top = ctx.dest_top;

    let mut text = String::from("= Documentation Index\n\n");
    push_entries(tree, top, file_name, &mut text);

    writeln!(text, "\n== Summary\n").ok();
    writeln!(text, "{}", ctx.report).ok();

    let documents: Vec<NodeId> = tree
        .leaves(top)
        .into_iter()
        .filter(|&leaf| leaf != top && tree.data(leaf).is_some() && !generated.contains(&leaf))
        .collect();
    if let Some(&first) = documents.first() {
        writeln!(text, "\n== All Documents\n").ok();
        let (stem, _) = tree.split_stem(first);
        let base = tree.pathname(top);
        if let Ok(shared) = stem.strip_prefix(&base)
            && !shared.as_os_str().is_empty()
        {
            writeln!(text, "All documents live below {}/.\n", shared.display()).ok();
        }
        for leaf in documents {
            let Some(doc) = tree.data(leaf) else { continue };
            let (_, crown) = tree.split_stem(leaf);
            if doc.outcome.is_success() {
                let link = tree
                    .relative_pathname(leaf, top)
                    .unwrap_or_else(|| PathBuf::from(tree.name(leaf)));
                let title = doc.display_title();
                writeln!(text, "* <<{},{}>> {title}", to_link(&link), crown.display()).ok();
            } else {
                writeln!(text, "* {} (conversion failed)", crown.display()).ok();
            }
        }
    }

    writeln!(
        text,
        "\nGenerated {}.",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    )
    .ok();
    text
}

fn to_link(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
