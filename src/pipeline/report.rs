//! Run summary collected while the pipeline executes.

use crate::log;
use std::{fmt, path::PathBuf};

/// A non-fatal problem tied to one source document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub path: PathBuf,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.message)
    }
}

/// Outcome of a whole run.
///
/// Filled in under both failure modes, so a run that continued past errors
/// still reports what happened.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub succeeded: usize,
    pub failed: usize,
    pub warnings: Vec<Warning>,
    /// `hook: message` for every hook that failed without aborting the run.
    pub hook_failures: Vec<String>,
}

impl BuildReport {
    /// Record and log a warning.
    pub fn warn(&mut self, path: impl Into<PathBuf>, message: impl Into<String>) {
        let warning = Warning {
            path: path.into(),
            message: message.into(),
        };
        log!("warn"; "{}", warning);
        self.warnings.push(warning);
    }

    /// Warnings whose message contains `needle`.
    pub fn warnings_matching<'a>(&'a self, needle: &'a str) -> impl Iterator<Item = &'a Warning> + 'a {
        self.warnings.iter().filter(move |w| w.message.contains(needle))
    }

    #[inline]
    pub const fn total(&self) -> usize {
        self.succeeded + self.failed
    }

    #[inline]
    pub fn is_clean(&self) -> bool {
        self.failed == 0 && self.hook_failures.is_empty()
    }
}

impl fmt::Display for BuildReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} converted, {} failed, {} warnings",
            self.succeeded,
            self.failed,
            self.warnings.len()
        )?;
        if !self.hook_failures.is_empty() {
            write!(f, ", {} hook failures", self.hook_failures.len())?;
        }
        Ok(())
    }
}
