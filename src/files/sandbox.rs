//! Root-directory sandboxing.
//!
//! Every virtual path coming off the wire is resolved here before anything
//! touches the filesystem. The containment check runs on canonical paths, so
//! symbolic links are followed before deciding whether a target is inside
//! the root.

use std::ffi::OsStr;
use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::warn;

/// Reserved directory under the root holding the HTML templates.
pub const TEMPLATE_DIR: &str = "templates";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SandboxError {
    #[error("template directory is not web-addressable")]
    TemplateDirectory,
    #[error("path escapes root: {0}")]
    EscapesRoot(String),
    #[error("path does not resolve: {0}")]
    NotFound(String),
}

/// A virtual path together with the on-disk location it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    pub virtual_path: String,
    /// Absolute, symlink-free path guaranteed to lie under the root
    pub canonical_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct PathSandbox {
    root: PathBuf,
}

impl PathSandbox {
    /// Creates a sandbox around `root`, which must already exist.
    pub fn new(root: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self {
            root: root.as_ref().canonicalize()?,
        })
    }

    /// The canonical root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn template_dir(&self) -> PathBuf {
        self.root.join(TEMPLATE_DIR)
    }

    /// Resolves `virtual_path` to an existing location under the root.
    ///
    /// - `/templates` and anything below it → [`SandboxError::TemplateDirectory`]
    /// - `..` climbing above the root, or a canonical target outside it →
    ///   [`SandboxError::EscapesRoot`]
    /// - target that cannot be canonicalized → [`SandboxError::NotFound`]
    pub fn resolve(&self, virtual_path: &str) -> Result<ResolvedPath, SandboxError> {
        let relative = normalize_virtual(virtual_path).ok_or_else(|| {
            warn!(path = %virtual_path, "Rejected path climbing above root");
            SandboxError::EscapesRoot(virtual_path.to_string())
        })?;

        if relative.components().next() == Some(Component::Normal(OsStr::new(TEMPLATE_DIR))) {
            warn!(path = %virtual_path, "Rejected template directory access");
            return Err(SandboxError::TemplateDirectory);
        }

        // `..` is left for the filesystem to apply after following symlinks
        let canonical_path = self
            .root
            .join(virtual_path.trim_start_matches('/'))
            .canonicalize()
            .map_err(|_| SandboxError::NotFound(virtual_path.to_string()))?;

        self.check_contained(virtual_path, &canonical_path)?;

        Ok(ResolvedPath {
            virtual_path: virtual_path.to_string(),
            canonical_path,
        })
    }

    /// Re-validates a write destination that may not exist yet.
    ///
    /// An existing destination (including a symlink) is canonicalized and
    /// checked; otherwise its parent directory is. Returns the path that
    /// should be written.
    pub fn verify_destination(&self, virtual_path: &str, dest: &Path) -> Result<PathBuf, SandboxError> {
        if dest.symlink_metadata().is_ok() {
            let canonical = dest
                .canonicalize()
                .map_err(|_| SandboxError::EscapesRoot(virtual_path.to_string()))?;
            self.check_contained(virtual_path, &canonical)?;
            return Ok(canonical);
        }

        let (Some(parent), Some(name)) = (dest.parent(), dest.file_name()) else {
            return Err(SandboxError::EscapesRoot(virtual_path.to_string()));
        };

        let canonical_parent = parent
            .canonicalize()
            .map_err(|_| SandboxError::NotFound(virtual_path.to_string()))?;
        self.check_contained(virtual_path, &canonical_parent)?;

        Ok(canonical_parent.join(name))
    }

    /// Whether `canonical` lies under the root (the root itself included).
    pub fn contains(&self, canonical: &Path) -> bool {
        canonical.starts_with(&self.root)
    }

    fn check_contained(&self, virtual_path: &str, canonical: &Path) -> Result<(), SandboxError> {
        if !self.contains(canonical) {
            warn!(
                path = %virtual_path,
                resolved = %canonical.display(),
                "Resolved path escapes root"
            );
            return Err(SandboxError::EscapesRoot(virtual_path.to_string()));
        }

        if canonical.starts_with(self.template_dir()) {
            warn!(path = %virtual_path, "Resolved path lands in template directory");
            return Err(SandboxError::TemplateDirectory);
        }

        Ok(())
    }
}

/// Lexically normalizes a virtual path into a root-relative path.
///
/// Leading slashes are stripped, `.` is dropped and `..` pops the previous
/// segment. Returns `None` when a `..` would climb above the root.
///
/// Only used to screen requests; the path actually opened is canonicalized
/// by the filesystem, where a `..` after a symlink climbs from the link
/// target.
pub fn normalize_virtual(virtual_path: &str) -> Option<PathBuf> {
    let mut parts: Vec<&OsStr> = Vec::new();

    for component in Path::new(virtual_path.trim_start_matches('/')).components() {
        match component {
            Component::Normal(name) => parts.push(name),
            Component::CurDir => {}
            Component::ParentDir => {
                parts.pop()?;
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    Some(parts.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::normalize_virtual;
    use std::path::PathBuf;

    #[test]
    fn normalize_handles_dots() {
        assert_eq!(normalize_virtual("/"), Some(PathBuf::new()));
        assert_eq!(normalize_virtual("/a/./b"), Some(PathBuf::from("a/b")));
        assert_eq!(normalize_virtual("/a/../b"), Some(PathBuf::from("b")));
        assert_eq!(normalize_virtual("//a//b/"), Some(PathBuf::from("a/b")));
    }

    #[test]
    fn normalize_rejects_climbing_above_root() {
        assert_eq!(normalize_virtual("/.."), None);
        assert_eq!(normalize_virtual("/a/../../etc/passwd"), None);
        assert_eq!(normalize_virtual("../x"), None);
    }
}
