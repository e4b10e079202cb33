use super::{NodeId, PathTree, TreeError};
use crate::log;
use std::path::Path;
use walkdir::WalkDir;

/// Files to ignore during directory traversal
const IGNORED_FILES: &[&str] = &[".DS_Store"];

impl<T> PathTree<T> {
    /// Build a tree from the files below `dir`.
    ///
    /// The tree root is the first segment of `dir`; the returned id is the
    /// node for `dir` itself. Only regular files for which `accept` returns
    /// true (given the path relative to `dir`) become leaves. Leaves carry no
    /// payload. Directory entries are visited in name order. Paths that are
    /// not valid UTF-8 are logged and left out.
    pub fn from_dir(dir: &Path, mut accept: impl FnMut(&Path) -> bool) -> Result<(Self, NodeId), TreeError> {
        let (mut tree, top) = Self::new(dir, None)?;

        let files = WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                let name = e.file_name().to_str().unwrap_or_default();
                !IGNORED_FILES.contains(&name)
            });

        for entry in files {
            let Ok(relative) = entry.path().strip_prefix(dir) else {
                continue;
            };
            // segment names are strings, a lossy name would point at no file
            if relative.to_str().is_none() {
                log!("warn"; "skipping non-UTF-8 path {}", entry.path().display());
                continue;
            }
            if accept(relative) {
                tree.add_descendants(top, relative, None)?;
            }
        }

        Ok((tree, top))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_from_dir_collects_accepted_files() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.adoc"), "= A").unwrap();
        fs::write(dir.path().join("b.png"), "").unwrap();
        fs::write(dir.path().join("sub/c.adoc"), "= C").unwrap();
        fs::write(dir.path().join(".DS_Store"), "").unwrap();

        let (tree, top) = PathTree::<()>::from_dir(dir.path(), |p| {
            p.extension().is_some_and(|ext| ext == "adoc")
        })
        .unwrap();

        assert_eq!(tree.pathname(top), dir.path());
        assert_eq!(
            tree.leaf_pathnames(top, true),
            vec![PathBuf::from("a.adoc"), PathBuf::from("sub/c.adoc")]
        );
    }

    // some unix filesystems refuse such names, linux ones accept them
    #[cfg(target_os = "linux")]
    #[test]
    fn test_from_dir_skips_non_utf8_names() {
        use std::{ffi::OsStr, os::unix::ffi::OsStrExt};

        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.adoc"), "= A").unwrap();
        fs::write(dir.path().join(OsStr::from_bytes(b"caf\xe9.adoc")), "= B").unwrap();

        let (tree, top) = PathTree::<()>::from_dir(dir.path(), |_| true).unwrap();
        let leaves = tree.leaf_pathnames(top, false);

        assert_eq!(leaves, vec![dir.path().join("a.adoc")]);
        assert!(leaves.iter().all(|p| p.is_file()));
    }

    #[test]
    fn test_from_dir_empty() {
        let dir = TempDir::new().unwrap();
        let (tree, top) = PathTree::<()>::from_dir(dir.path(), |_| true).unwrap();
        assert!(tree.is_leaf(top));
    }
}
