use super::{document_title, text_severity};
use crate::pipeline::{DestHint, RenderOutput, Renderer, SourceDoc};
use anyhow::Result;

/// Writes the preprocessed text as is.
pub struct TextRenderer {
    extension: String,
}

impl TextRenderer {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }
}

impl Renderer for TextRenderer {
    fn name(&self) -> &str {
        "text"
    }

    fn extension(&self) -> &str {
        &self.extension
    }

    fn convert(&self, source: &SourceDoc, _dest: &DestHint<'_>) -> Result<RenderOutput> {
        Ok(RenderOutput {
            bytes: source.text.clone().into_bytes(),
            title: document_title(&source.text),
            severity: text_severity(&source.text),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Severity;
    use std::path::Path;

    #[test]
    fn test_pass_through() {
        let renderer = TextRenderer::new("txt");
        let doc = SourceDoc::new("= Notes\n\nSee <<b.txt,B>>.\n");
        let out = renderer
            .convert(&doc, &DestHint { relative_path: Path::new("a.txt") })
            .unwrap();

        assert_eq!(out.bytes, doc.text.as_bytes());
        assert_eq!(out.title.as_deref(), Some("Notes"));
        assert_eq!(out.severity, Severity::None);
    }
}
