//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#true() -> bool {
    true
}

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::path::PathBuf;

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn source() -> PathBuf {
        "docs".into()
    }

    pub fn output() -> PathBuf {
        "public".into()
    }

    pub fn extensions() -> Vec<String> {
        vec!["adoc".into(), "txt".into()]
    }

    pub mod renderer {
        use crate::config::RendererKind;

        pub fn kind() -> RendererKind {
            RendererKind::default()
        }

        pub fn command() -> Vec<String> {
            Vec::new()
        }

        pub fn extension() -> Option<String> {
            None
        }
    }
}

// ============================================================================
// [index] Section Defaults
// ============================================================================

pub mod index {
    pub fn name() -> String {
        "index".into()
    }
}

// ============================================================================
// [graph] Section Defaults
// ============================================================================

pub mod graph {
    use std::path::PathBuf;

    pub fn path() -> PathBuf {
        "docdeps.dot".into()
    }
}

// ============================================================================
// [assets] Section Defaults
// ============================================================================

pub mod assets {
    pub fn extensions() -> Vec<String> {
        ["png", "jpg", "jpeg", "gif", "svg", "css", "js"]
            .into_iter()
            .map(Into::into)
            .collect()
    }
}
