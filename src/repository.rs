use std::{
    fmt,
    path::{Path, PathBuf},
};
use thiserror::Error;

const ROOT: &str = ".";

/// A custom error describing why a string is not a valid repository path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PathError {
    /// There were no segments left after normalization.
    #[error("repository path is empty")]
    Empty,
    /// One of the segments is `..`, which would escape the working directory.
    #[error("repository path {0:?} escapes the working directory")]
    Traversal(String),
    /// The path contains a NUL byte.
    #[error("repository path contains invalid characters")]
    InvalidCharacters,
}

/// A normalized, slash-separated relative path of a mirrored repository.
///
/// It is the key for the per-path workers and their last run, so two spellings
/// of the same repository (`acme//repo/`, `/acme/./repo`) parse to the same value.
/// The [root](RepositoryPath::root) path is the working directory itself, it can
/// only be constructed in code and never parsed from a request.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RepositoryPath(String);

impl RepositoryPath {
    /// Parse and normalize an untrusted path, for example the path of an HTTP request.
    pub fn parse(raw: &str) -> Result<Self, PathError> {
        if raw.contains('\0') {
            return Err(PathError::InvalidCharacters);
        }

        let mut segments = vec![];
        for segment in raw.split('/') {
            match segment {
                "" | "." => continue,
                ".." => return Err(PathError::Traversal(raw.to_string())),
                segment => segments.push(segment),
            }
        }

        if segments.is_empty() {
            return Err(PathError::Empty);
        }

        Ok(RepositoryPath(segments.join("/")))
    }

    /// The working directory root. Requests on this path are never serialized
    /// against an earlier run.
    pub fn root() -> Self {
        RepositoryPath(ROOT.to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The directory of this repository under the given working directory.
    pub fn directory(&self, root: &Path) -> PathBuf {
        if self.is_root() {
            root.to_path_buf()
        } else {
            self.0.split('/').fold(root.to_path_buf(), |dir, segment| dir.join(segment))
        }
    }
}

impl fmt::Display for RepositoryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
