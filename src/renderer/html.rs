use super::{document_title, text_severity};
use crate::pipeline::{DestHint, RenderOutput, Renderer, SourceDoc};
use anyhow::Result;
use regex::Regex;
use std::{fmt::Write, sync::LazyLock};

/// `<<target[,display]>>`, after docid resolution `target` is `path[#section]`.
static LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<<([^,>]+?)(?:,([^>]*))?>>").unwrap());

static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(=+)\s+(\S.*)$").unwrap());

/// `[[id]]` or `[#id]` on a line of its own.
static ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:\[\[([\w:.-]+)\]\]|\[#([\w:.-]+)\])$").unwrap());

/// `* item` or `- item`
static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[*-]\s+(\S.*)$").unwrap());

static ATTRIBUTE_ENTRY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^:[\w-]+!?:").unwrap());

/// Renders the small markup subset needed to browse the output.
pub struct HtmlRenderer {
    extension: String,
}

impl HtmlRenderer {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }
}

impl Renderer for HtmlRenderer {
    fn name(&self) -> &str {
        "html"
    }

    fn extension(&self) -> &str {
        &self.extension
    }

    fn convert(&self, source: &SourceDoc, _dest: &DestHint<'_>) -> Result<RenderOutput> {
        let title = document_title(&source.text);
        let page_title = title
            .clone()
            .or_else(|| source.attributes.get("docname").cloned())
            .unwrap_or_default();

        let mut html = String::new();
        writeln!(html, "<!DOCTYPE html>")?;
        let lang = source.attributes.get("lang").map_or("en", String::as_str);
        writeln!(html, "<html lang=\"{}\">", escape(lang))?;
        writeln!(html, "<head>\n<meta charset=\"utf-8\">")?;
        writeln!(html, "<title>{}</title>", escape(&page_title))?;
        writeln!(html, "</head>\n<body>")?;
        render_body(&source.text, &mut html)?;
        writeln!(html, "</body>\n</html>")?;

        Ok(RenderOutput {
            bytes: html.into_bytes(),
            title,
            severity: text_severity(&source.text),
        })
    }
}

/// Lines collected for the block being built.
enum Block<'a> {
    Paragraph(Vec<&'a str>),
    List(Vec<&'a str>),
}

fn render_body(text: &str, out: &mut String) -> std::fmt::Result {
    let mut block: Option<Block<'_>> = None;
    let mut anchor: Option<String> = None;
    let mut in_comment = false;
    let mut in_passthrough = false;

    for line in text.lines() {
        let trimmed = line.trim_end();

        if !in_passthrough && trimmed == "////" {
            in_comment = !in_comment;
            continue;
        }
        if in_comment {
            continue;
        }
        if trimmed == "++++" {
            flush_block(&mut block, out)?;
            in_passthrough = !in_passthrough;
            continue;
        }
        if in_passthrough {
            writeln!(out, "{line}")?;
            continue;
        }

        if trimmed.is_empty() {
            flush_block(&mut block, out)?;
        } else if trimmed.starts_with("//") || ATTRIBUTE_ENTRY.is_match(trimmed) {
            continue;
        } else if let Some(caps) = ANCHOR.captures(trimmed) {
            flush_block(&mut block, out)?;
            anchor = caps.get(1).or_else(|| caps.get(2)).map(|m| m.as_str().to_owned());
        } else if let Some(caps) = HEADING.captures(trimmed) {
            flush_block(&mut block, out)?;
            let level = caps[1].len().min(6);
            let heading = &caps[2];
            let id = anchor.take().unwrap_or_else(|| auto_id(heading));
            writeln!(out, "<h{level} id=\"{}\">{}</h{level}>", escape(&id), render_inline(heading))?;
        } else if let Some(caps) = LIST_ITEM.captures(trimmed) {
            let item = caps.get(1).map_or("", |m| m.as_str());
            match &mut block {
                Some(Block::List(items)) => items.push(item),
                _ => {
                    flush_block(&mut block, out)?;
                    block = Some(Block::List(vec![item]));
                }
            }
        } else {
            match &mut block {
                Some(Block::Paragraph(lines)) => lines.push(trimmed),
                _ => {
                    flush_block(&mut block, out)?;
                    block = Some(Block::Paragraph(vec![trimmed]));
                }
            }
        }
    }
    flush_block(&mut block, out)
}

fn flush_block(block: &mut Option<Block<'_>>, out: &mut String) -> std::fmt::Result {
    match block.take() {
        None => Ok(()),
        Some(Block::Paragraph(lines)) => {
            let body: Vec<String> = lines.into_iter().map(render_inline).collect();
            writeln!(out, "<p>{}</p>", body.join("\n"))
        }
        Some(Block::List(items)) => {
            writeln!(out, "<ul>")?;
            for item in items {
                writeln!(out, "<li>{}</li>", render_inline(item))?;
            }
            writeln!(out, "</ul>")
        }
    }
}

/// Escape text and turn `<<...>>` references into anchors.
fn render_inline(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut last = 0;
    for caps in LINK.captures_iter(line) {
        let Some(whole) = caps.get(0) else { continue };
        out.push_str(&escape(&line[last..whole.start()]));

        let target = caps[1].trim();
        let display = caps
            .get(2)
            .map(|m| m.as_str().trim())
            .filter(|d| !d.is_empty())
            .unwrap_or(target);
        let href = if target.contains(['/', '.', '#']) {
            target.to_owned()
        } else {
            format!("#{target}")
        };
        out.push_str(&format!("<a href=\"{}\">{}</a>", escape(&href), escape(display)));
        last = whole.end();
    }
    out.push_str(&escape(&line[last..]));
    out
}

/// `Getting Started` -> `_getting_started`
fn auto_id(heading: &str) -> String {
    let mut id = String::from("_");
    for c in heading.chars() {
        if c.is_alphanumeric() {
            id.extend(c.to_lowercase());
        } else if !id.ends_with('_') {
            id.push('_');
        }
    }
    if id.len() > 1 && id.ends_with('_') {
        id.pop();
    }
    id
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
