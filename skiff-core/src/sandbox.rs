//! Sandbox Path Resolver
//!
//! Resolves model-supplied paths against the fixed working-directory root
//! and rejects anything that escapes it. All file and process tools go
//! through [`resolve`] before touching the filesystem.

use std::ffi::OsString;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::error::ToolError;

/// Resolve `candidate` against `root` and require the result to stay
/// inside `root`.
///
/// `candidate` may be relative (joined onto `root`) or absolute (accepted
/// only if it already points inside `root`). `.` and `..` segments are
/// normalized, and any prefix of the path that exists on disk is
/// canonicalized, so symlinks cannot smuggle a path out of the sandbox.
/// The target itself does not need to exist.
///
/// Containment is checked component-wise: a sibling directory that merely
/// shares a name prefix with `root` (`/work2` vs `/work`) does not pass.
pub fn resolve(root: &Path, candidate: &str) -> Result<PathBuf, ToolError> {
    let root = root.canonicalize()?;
    let normalized = normalize(&root.join(candidate));
    let resolved = canonicalize_partial(&normalized)?;

    if resolved.starts_with(&root) {
        Ok(resolved)
    } else {
        Err(ToolError::PathTraversal(candidate.to_string()))
    }
}

/// Lexically remove `.` segments and fold `..` segments. The input is
/// always absolute here, so popping past the filesystem root is a no-op,
/// matching OS semantics for `/..`.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Canonicalize the deepest existing ancestor of `path`, then re-append
/// the non-existent remainder. The remainder is already normalized, so it
/// contains no `..` segments that could undo the canonical prefix.
fn canonicalize_partial(path: &Path) -> io::Result<PathBuf> {
    let mut existing = path;
    let mut tail: Vec<OsString> = Vec::new();

    while existing.symlink_metadata().is_err() {
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                tail.push(name.to_os_string());
                existing = parent;
            }
            _ => break,
        }
    }

    let mut out = existing.canonicalize()?;
    for name in tail.iter().rev() {
        out.push(name);
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        (dir, root)
    }

    #[test]
    fn relative_path_inside_root() {
        let (_dir, root) = root();
        std::fs::create_dir(root.join("sub")).unwrap();
        let resolved = resolve(&root, "sub/file.txt").unwrap();
        assert_eq!(resolved, root.join("sub").join("file.txt"));
    }

    #[test]
    fn dot_resolves_to_root_itself() {
        let (_dir, root) = root();
        assert_eq!(resolve(&root, ".").unwrap(), root);
    }

    #[test]
    fn target_does_not_need_to_exist() {
        let (_dir, root) = root();
        let resolved = resolve(&root, "out/report.md").unwrap();
        assert!(resolved.starts_with(&root));
        assert!(!resolved.exists());
    }

    #[test]
    fn parent_escape_is_rejected() {
        let (_dir, root) = root();
        assert!(matches!(
            resolve(&root, "../outside.txt"),
            Err(ToolError::PathTraversal(_))
        ));
    }

    #[test]
    fn deep_escape_is_rejected() {
        let (_dir, root) = root();
        assert!(matches!(
            resolve(&root, "a/b/../../../../etc/passwd"),
            Err(ToolError::PathTraversal(_))
        ));
    }

    #[test]
    fn interior_dotdot_is_allowed() {
        let (_dir, root) = root();
        let resolved = resolve(&root, "a/../b.txt").unwrap();
        assert_eq!(resolved, root.join("b.txt"));
    }

    #[test]
    fn absolute_path_inside_root_is_accepted() {
        let (_dir, root) = root();
        let inside = root.join("file.txt");
        let resolved = resolve(&root, inside.to_str().unwrap()).unwrap();
        assert_eq!(resolved, inside);
    }

    #[test]
    fn absolute_path_outside_root_is_rejected() {
        let (_dir, root) = root();
        assert!(matches!(
            resolve(&root, "/etc/passwd"),
            Err(ToolError::PathTraversal(_))
        ));
    }

    #[test]
    fn sibling_sharing_name_prefix_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().canonicalize().unwrap();
        let root = base.join("work");
        let sibling = base.join("work2");
        std::fs::create_dir(&root).unwrap();
        std::fs::create_dir(&sibling).unwrap();

        assert!(matches!(
            resolve(&root, "../work2/file.txt"),
            Err(ToolError::PathTraversal(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_escape_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().canonicalize().unwrap();
        let root = base.join("work");
        let outside = base.join("elsewhere");
        std::fs::create_dir(&root).unwrap();
        std::fs::create_dir(&outside).unwrap();
        std::os::unix::fs::symlink(&outside, root.join("link")).unwrap();

        assert!(matches!(
            resolve(&root, "link/secret.txt"),
            Err(ToolError::PathTraversal(_))
        ));
    }
}
