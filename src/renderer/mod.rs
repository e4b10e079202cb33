//! Built-in [`Renderer`] implementations.
//!
//! | Kind      | Output                                                |
//! |-----------|-------------------------------------------------------|
//! | `html`    | Minimal HTML page: headings, paragraphs, links        |
//! | `text`    | The preprocessed text, unchanged                      |
//! | `command` | Whatever an external program prints for the text      |

mod command;
mod html;
mod text;

pub use command::CommandRenderer;
pub use html::HtmlRenderer;
pub use text::TextRenderer;

use crate::{
    config::{RendererConfig, RendererKind},
    pipeline::{Renderer, Severity},
    xref::{UNRESOLVED_MARKER, header::header_lines},
};

/// Build the renderer selected by `[build.renderer]`.
pub fn from_config(config: &RendererConfig) -> Box<dyn Renderer> {
    let extension = config.output_extension().to_owned();
    match config.kind {
        RendererKind::Html => Box::new(HtmlRenderer::new(extension)),
        RendererKind::Text => Box::new(TextRenderer::new(extension)),
        RendererKind::Command => Box::new(CommandRenderer::new(config.command.clone(), extension)),
    }
}

/// Level-0 title (`= Title`) from the document header.
pub fn document_title(text: &str) -> Option<String> {
    header_lines(text)
        .find_map(|line| line.strip_prefix("= "))
        .map(|title| title.trim().to_owned())
        .filter(|title| !title.is_empty())
}

/// Warning when a docid reference was left unresolved, none otherwise.
fn text_severity(text: &str) -> Severity {
    if text.contains(UNRESOLVED_MARKER) {
        Severity::Warning
    } else {
        Severity::None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_title() {
        assert_eq!(document_title("= Intro\n:docid: D-1\n\nBody").as_deref(), Some("Intro"));
        // the title line closes a header opened by an attribute
        assert_eq!(document_title(":toc:\n= Guide\n"), None);
        assert_eq!(document_title("== Section only\n"), None);
        assert_eq!(document_title("plain text\n= Late title\n"), Some("Late title".into()));
        assert_eq!(document_title(""), None);
    }

    #[test]
    fn test_from_config_extension() {
        let mut config = RendererConfig::default();
        assert_eq!(from_config(&config).extension(), "html");
        assert_eq!(from_config(&config).name(), "html");

        config.kind = RendererKind::Text;
        assert_eq!(from_config(&config).extension(), "txt");

        config.kind = RendererKind::Command;
        config.command = vec!["cat".into()];
        config.extension = Some("xml".into());
        let renderer = from_config(&config);
        assert_eq!(renderer.extension(), "xml");
        assert_eq!(renderer.name(), "cat");
    }

    #[test]
    fn test_text_severity() {
        assert_eq!(text_severity("fine"), Severity::None);
        assert_eq!(text_severity("x [unresolved docid: A1] y"), Severity::Warning);
    }
}
