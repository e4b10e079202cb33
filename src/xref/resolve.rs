use super::SharedIndex;
use crate::pipeline::{DocContext, Preprocessor, dest_relative_path};
use anyhow::{Result, bail};
use regex::{Captures, Regex};
use std::{
    path::{Component, Path},
    sync::LazyLock,
};

/// `<<:docid:TARGET[#SECTION][,DISPLAY]>>`
static DOCID_REF: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<<\s*:docid:\s*(.*?)>>").unwrap());

/// Prefix of the text that replaces a reference to an unknown docid.
pub const UNRESOLVED_MARKER: &str = "[unresolved docid: ";

/// Block delimiter whose content is passed through untouched.
const PASSTHROUGH_DELIMITER: &str = "++++";
/// Block delimiter of a multi-line comment.
const COMMENT_DELIMITER: &str = "////";

/// Second pass: rewrite docid references into relative links.
pub struct DocIdResolver {
    index: SharedIndex,
}

impl DocIdResolver {
    pub fn new(index: SharedIndex) -> Self {
        Self { index }
    }
}

/// Parsed body of one reference.
#[derive(Debug, PartialEq, Eq)]
struct Reference<'a> {
    target: &'a str,
    section: Option<&'a str>,
    display: &'a str,
}

fn parse_reference(body: &str) -> Reference<'_> {
    let (link, display) = match body.split_once(',') {
        Some((link, display)) => (link, Some(display.trim())),
        None => (body, None),
    };
    let (target, section) = match link.split_once('#') {
        Some((target, section)) => (target.trim(), Some(section.trim())),
        None => (link.trim(), None),
    };
    Reference {
        target,
        section: section.filter(|s| !s.is_empty()),
        display: display.filter(|d| !d.is_empty()).unwrap_or(target),
    }
}

impl Preprocessor for DocIdResolver {
    fn name(&self) -> &str {
        "docid-resolve"
    }

    fn process(&mut self, ctx: &mut DocContext<'_>, text: String) -> Result<String> {
        if !self.index.read().is_sealed() {
            bail!("docid references resolved before all docids were collected");
        }

        let source = ctx
            .src_tree
            .relative_pathname(ctx.src_node, ctx.src_top)
            .unwrap_or_default();
        let from_dir = ctx.dest_relative.parent().unwrap_or(Path::new(""));

        let mut out = String::with_capacity(text.len());
        let mut in_passthrough = false;
        let mut in_comment = false;

        for line in text.split_inclusive('\n') {
            let trimmed = line.trim_end();
            if !in_passthrough && trimmed == COMMENT_DELIMITER {
                in_comment = !in_comment;
            } else if !in_comment && trimmed == PASSTHROUGH_DELIMITER {
                in_passthrough = !in_passthrough;
            }

            if in_comment || in_passthrough || trimmed.starts_with("//") || !DOCID_REF.is_match(line) {
                out.push_str(line);
                continue;
            }

            let rewritten = DOCID_REF.replace_all(line, |caps: &Captures<'_>| {
                let reference = parse_reference(&caps[1]);
                let target = self.index.read().lookup(reference.target);
                match target {
                    Some(node) => {
                        let target_source = ctx
                            .src_tree
                            .relative_pathname(node, ctx.src_top)
                            .unwrap_or_default();
                        let target_dest = dest_relative_path(&target_source, ctx.extension);
                        let link = relative_link(from_dir, &target_dest);

                        self.index
                            .write()
                            .record_dependency(ctx.src_node, reference.target);

                        match reference.section {
                            Some(section) => format!("<<{link}#{section},{}>>", reference.display),
                            None => format!("<<{link},{}>>", reference.display),
                        }
                    }
                    None => {
                        ctx.report.warn(
                            &source,
                            format!("unresolved docid `{}`", reference.target),
                        );
                        format!("{UNRESOLVED_MARKER}{}]", reference.target)
                    }
                }
            });
            out.push_str(&rewritten);
        }

        Ok(out)
    }
}

/// Path from directory `from_dir` to file `to`, both relative to the same
/// root, joined with `/`.
pub fn relative_link(from_dir: &Path, to: &Path) -> String {
    let from: Vec<Component<'_>> = from_dir.components().collect();
    let to: Vec<Component<'_>> = to.components().collect();
    let common = from
        .iter()
        .zip(&to)
        .take_while(|(a, b)| a == b)
        .count();

    let ups = std::iter::repeat_n("..".to_owned(), from.len() - common);
    let downs = to[common..]
        .iter()
        .map(|c| c.as_os_str().to_string_lossy().into_owned());
    ups.chain(downs).collect::<Vec<_>>().join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        pipeline::{BuildReport, SourceTree},
        xref::XrefIndex,
    };
    use std::{path::PathBuf, sync::Arc};

    #[test]
    fn test_parse_reference() {
        assert_eq!(
            parse_reference("D-1"),
            Reference { target: "D-1", section: None, display: "D-1" }
        );
        assert_eq!(
            parse_reference(" D-1 #intro , The Intro"),
            Reference { target: "D-1", section: Some("intro"), display: "The Intro" }
        );
        assert_eq!(
            parse_reference("D-1,Shown"),
            Reference { target: "D-1", section: None, display: "Shown" }
        );
        assert_eq!(
            parse_reference("D-1#,"),
            Reference { target: "D-1", section: None, display: "D-1" }
        );
    }

    #[test]
    fn test_relative_link() {
        assert_eq!(relative_link(Path::new(""), Path::new("b.html")), "b.html");
        assert_eq!(relative_link(Path::new(""), Path::new("sub/b.html")), "sub/b.html");
        assert_eq!(relative_link(Path::new("sub"), Path::new("a.html")), "../a.html");
        assert_eq!(relative_link(Path::new("x/y"), Path::new("x/z/c.html")), "../z/c.html");
        assert_eq!(relative_link(Path::new("x"), Path::new("x/c.html")), "c.html");
    }

    /// Source tree with `a.adoc` (D-1) and `sub/b.adoc` (D-2), index already sealed.
    fn fixture() -> (SourceTree, SharedIndex) {
        let (mut tree, top) = SourceTree::new("src", None).unwrap();
        let a = tree.add_descendants(top, "a.adoc", None).unwrap();
        let b = tree.add_descendants(top, "sub/b.adoc", None).unwrap();
        let mut index = XrefIndex::default();
        index.register("D-1", a);
        index.register("D-2", b);
        index.seal();
        (tree, Arc::new(parking_lot::RwLock::new(index)))
    }

    fn resolve(tree: &SourceTree, index: &SharedIndex, node: &str, text: &str) -> (String, BuildReport) {
        let top = tree.root();
        let src_node = tree.node(top, node, false).unwrap();
        let dest_relative = PathBuf::from(node).with_extension("html");
        let mut report = BuildReport::default();
        let mut ctx = DocContext {
            src_tree: tree,
            src_top: top,
            src_node,
            dest_relative: &dest_relative,
            extension: "html",
            report: &mut report,
        };
        let out = DocIdResolver::new(index.clone())
            .process(&mut ctx, text.to_owned())
            .unwrap();
        (out, report)
    }

    #[test]
    fn test_rewrites_multiple_refs_per_line() {
        let (tree, index) = fixture();
        let (out, report) = resolve(&tree, &index, "a.adoc", "<<:docid:D-2>> and << :docid: D-1#top,me>>\n");
        assert_eq!(out, "<<sub/b.html,D-2>> and <<a.html#top,me>>\n");
        assert!(report.warnings.is_empty());

        let a = tree.node(tree.root(), "a.adoc", false).unwrap();
        let index = index.read();
        let deps = &index.dependencies()[&a];
        assert_eq!(deps.iter().map(String::as_str).collect::<Vec<_>>(), ["D-1", "D-2"]);
    }

    #[test]
    fn test_dependencies_deduplicated() {
        let (tree, index) = fixture();
        resolve(&tree, &index, "a.adoc", "<<:docid:D-2>>\n<<:docid:D-2#x>>\n");
        let a = tree.node(tree.root(), "a.adoc", false).unwrap();
        assert_eq!(index.read().dependencies()[&a].len(), 1);
    }

    #[test]
    fn test_skips_comments_and_passthrough() {
        let (tree, index) = fixture();
        let text = "\
// <<:docid:D-2>>
////
<<:docid:D-2>>
////
++++
<<:docid:D-2>>
++++
<<:docid:D-2>>
";
        let (out, _) = resolve(&tree, &index, "a.adoc", text);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "// <<:docid:D-2>>");
        assert_eq!(lines[2], "<<:docid:D-2>>");
        assert_eq!(lines[5], "<<:docid:D-2>>");
        assert_eq!(lines[7], "<<sub/b.html,D-2>>");
    }

    #[test]
    fn test_unknown_target_marker() {
        let (tree, index) = fixture();
        let (out, report) = resolve(&tree, &index, "sub/b.adoc", "x <<:docid:NOPE,label>> y");
        assert_eq!(out, "x [unresolved docid: NOPE] y");
        assert_eq!(report.warnings.len(), 1);
        assert_eq!(report.warnings[0].path, PathBuf::from("sub/b.adoc"));
    }

    #[test]
    fn test_refuses_unsealed_index() {
        let (tree, _) = fixture();
        let index = SharedIndex::default();
        let top = tree.root();
        let src_node = tree.node(top, "a.adoc", false).unwrap();
        let mut report = BuildReport::default();
        let mut ctx = DocContext {
            src_tree: &tree,
            src_top: top,
            src_node,
            dest_relative: Path::new("a.html"),
            extension: "html",
            report: &mut report,
        };
        assert!(DocIdResolver::new(index).process(&mut ctx, String::new()).is_err());
    }
}
