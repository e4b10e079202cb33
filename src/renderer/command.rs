use super::document_title;
use crate::{
    log,
    pipeline::{DestHint, RenderOutput, Renderer, Severity, SourceDoc},
};
use anyhow::{Context, Result, bail};
use std::{
    io::{ErrorKind, Write},
    process::{Command, Stdio},
    thread,
};

/// Environment variable prefix for document attributes.
const ATTRIBUTE_ENV_PREFIX: &str = "DOCWEAVE_ATTR_";

/// Pipes every document through an external program.
///
/// The text goes to stdin, stdout becomes the output file. Attributes are
/// exported as `DOCWEAVE_ATTR_<NAME>` and the destination as `DOCWEAVE_DEST`.
/// Stderr lines mentioning `ERROR` or `WARNING` raise the severity.
pub struct CommandRenderer {
    command: Vec<String>,
    extension: String,
}

impl CommandRenderer {
    pub fn new(command: Vec<String>, extension: impl Into<String>) -> Self {
        Self {
            command,
            extension: extension.into(),
        }
    }
}

impl Renderer for CommandRenderer {
    fn name(&self) -> &str {
        self.command.first().map_or("command", String::as_str)
    }

    fn extension(&self) -> &str {
        &self.extension
    }

    fn convert(&self, source: &SourceDoc, dest: &DestHint<'_>) -> Result<RenderOutput> {
        let Some((program, args)) = self.command.split_first() else {
            bail!("[build.renderer.command] is empty");
        };

        let mut command = Command::new(program);
        command
            .args(args)
            .env("DOCWEAVE_DEST", dest.relative_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        for (key, value) in &source.attributes {
            let name = key.to_ascii_uppercase().replace('-', "_");
            command.env(format!("{ATTRIBUTE_ENV_PREFIX}{name}"), value);
        }

        let mut child = command
            .spawn()
            .with_context(|| format!("Failed to spawn `{program}`"))?;

        let mut stdin = child.stdin.take().context("Failed to acquire stdin")?;
        let text = source.text.clone();
        // The child may block on a full stdout pipe before reading all input.
        let writer = thread::spawn(move || stdin.write_all(text.as_bytes()));

        let output = child
            .wait_with_output()
            .with_context(|| format!("`{program}` process failed"))?;
        let written = writer
            .join()
            .map_err(|_| anyhow::anyhow!("stdin writer for `{program}` panicked"))?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            bail!("`{program}` exited with {}\n{}", output.status, stderr.trim_end());
        }
        // A program may exit without reading all of its input.
        if let Err(e) = written
            && e.kind() != ErrorKind::BrokenPipe
        {
            return Err(e).with_context(|| format!("Failed to write to `{program}`"));
        }

        let severity = stderr_severity(&stderr);
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            log!("render"; "{}: {}", dest.relative_path.display(), line);
        }

        Ok(RenderOutput {
            bytes: output.stdout,
            title: document_title(&source.text),
            severity,
        })
    }
}

fn stderr_severity(stderr: &str) -> Severity {
    stderr
        .lines()
        .map(|line| {
            if line.contains("ERROR") {
                Severity::Error
            } else if line.contains("WARNING") {
                Severity::Warning
            } else if line.trim().is_empty() {
                Severity::None
            } else {
                Severity::Info
            }
        })
        .max()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn hint() -> DestHint<'static> {
        DestHint { relative_path: Path::new("guide/a.html") }
    }

    #[test]
    fn test_stderr_severity() {
        assert_eq!(stderr_severity(""), Severity::None);
        assert_eq!(stderr_severity("note\n"), Severity::Info);
        assert_eq!(stderr_severity("asciidoctor: WARNING: x\nnote"), Severity::Warning);
        assert_eq!(stderr_severity("WARNING: a\nERROR: b"), Severity::Error);
    }

    #[test]
    fn test_empty_command_fails() {
        let renderer = CommandRenderer::new(Vec::new(), "html");
        assert_eq!(renderer.name(), "command");
        assert!(renderer.convert(&SourceDoc::new("x"), &hint()).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_pipes_through_cat() {
        let renderer = CommandRenderer::new(vec!["cat".into()], "html");
        let doc = SourceDoc::new("= Piped\n\nbody\n");
        let out = renderer.convert(&doc, &hint()).unwrap();

        assert_eq!(out.bytes, doc.text.as_bytes());
        assert_eq!(out.title.as_deref(), Some("Piped"));
        assert_eq!(out.severity, Severity::None);
    }

    #[cfg(unix)]
    #[test]
    fn test_attributes_and_dest_in_env() {
        let renderer = CommandRenderer::new(
            vec!["sh".into(), "-c".into(), "printf '%s %s' \"$DOCWEAVE_ATTR_TOC_LEVEL\" \"$DOCWEAVE_DEST\"".into()],
            "html",
        );
        let mut doc = SourceDoc::new("");
        doc.attributes.insert("toc-level".into(), "2".into());
        let out = renderer.convert(&doc, &hint()).unwrap();

        assert_eq!(String::from_utf8(out.bytes).unwrap(), "2 guide/a.html");
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_error() {
        let renderer = CommandRenderer::new(
            vec!["sh".into(), "-c".into(), "echo broken >&2; exit 3".into()],
            "html",
        );
        let err = renderer.convert(&SourceDoc::new("x"), &hint()).unwrap_err();
        assert!(format!("{err:#}").contains("broken"));
    }
}
