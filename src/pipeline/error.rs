//! Build error types.

use crate::tree::TreeError;
use std::{fmt, path::PathBuf};
use thiserror::Error;

/// Which hook list a failing hook belonged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    PreBuild,
    PostBuild,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PreBuild => "pre-build",
            Self::PostBuild => "post-build",
        })
    }
}

/// Errors surfaced by a pipeline run.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid tree operation")]
    Structural(#[from] TreeError),

    #[error("failed to convert `{}`: {message}", .path.display())]
    Conversion { path: PathBuf, message: String },

    #[error("{phase} hook `{hook}` failed")]
    Hook {
        phase: Phase,
        hook: String,
        #[source]
        source: anyhow::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_error_display() {
        let err = BuildError::Conversion {
            path: PathBuf::from("a.adoc"),
            message: "renderer crashed".into(),
        };
        let display = format!("{err}");
        assert!(display.contains("a.adoc"));
        assert!(display.contains("renderer crashed"));

        let err = BuildError::Hook {
            phase: Phase::PostBuild,
            hook: "index".into(),
            source: anyhow::anyhow!("disk full"),
        };
        assert_eq!(format!("{err}"), "post-build hook `index` failed");
        assert_eq!(format!("{:#}", anyhow::Error::from(err)), "post-build hook `index` failed: disk full");
    }
}
