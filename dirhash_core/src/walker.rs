//! Deterministic directory tree walker
//!
//! Wraps `walkdir` with file-name sorting so two walks over identical trees
//! always visit regular files in the same order. The walk is cooperative: a
//! cancellation flag is consulted before every entry.

use crate::error::{Error, IoError, Result, ValidationError};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use walkdir::WalkDir;

/// Options for a tree walk
#[derive(Debug, Clone, Default)]
pub struct WalkOptions {
    /// Follow symbolic links
    pub follow_links: bool,
}

impl WalkOptions {
    /// Set whether to follow symbolic links
    pub fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }
}

/// A regular file found by the walker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkedFile {
    /// Full path as seen by the walker
    pub path: PathBuf,
    /// Path relative to the walk root
    pub relative_path: PathBuf,
}

impl WalkedFile {
    /// Raw bytes of the relative path, `/`-separated, for the aggregate digest
    ///
    /// Names are taken as encoded, so two names that differ only in invalid
    /// UTF-8 still produce different keys.
    pub fn aggregate_key(&self) -> Vec<u8> {
        let mut key = Vec::new();
        for (i, component) in self.relative_path.components().enumerate() {
            if i > 0 {
                key.push(b'/');
            }
            key.extend_from_slice(component.as_os_str().as_encoded_bytes());
        }
        key
    }
}

/// Outcome of visiting one entry
#[derive(Debug)]
pub enum WalkStep {
    /// A regular file to hash
    File(WalkedFile),
    /// Cancellation was observed before the next entry
    Cancelled,
}

/// Check that `path` names an accessible directory
pub fn validate_root(path: &Path) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(Error::Validation(ValidationError::invalid_path(
            path,
            "path is empty",
        )));
    }

    let metadata = std::fs::metadata(path).map_err(|e| {
        Error::Validation(ValidationError::invalid_path(path, &e.to_string()))
    })?;
    if !metadata.is_dir() {
        return Err(Error::Validation(ValidationError::invalid_path(
            path,
            "not a directory",
        )));
    }

    // Listing must work too, otherwise the job would fail immediately
    std::fs::read_dir(path).map_err(|e| {
        Error::Validation(ValidationError::invalid_path(path, &e.to_string()))
    })?;

    Ok(path.to_path_buf())
}

/// Streaming, sorted walk over the regular files below a root
pub struct TreeWalker<'a> {
    root: PathBuf,
    entries: walkdir::IntoIter,
    cancel: &'a AtomicBool,
}

impl<'a> TreeWalker<'a> {
    pub fn new(root: &Path, options: &WalkOptions, cancel: &'a AtomicBool) -> Self {
        let walker = WalkDir::new(root)
            .follow_links(options.follow_links)
            .sort_by_file_name();

        Self {
            root: root.to_path_buf(),
            entries: walker.into_iter(),
            cancel,
        }
    }

    fn relative(&self, path: &Path) -> PathBuf {
        path.strip_prefix(&self.root).unwrap_or(path).to_path_buf()
    }
}

impl Iterator for TreeWalker<'_> {
    type Item = Result<WalkStep>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.cancel.load(Ordering::Acquire) {
                return Some(Ok(WalkStep::Cancelled));
            }

            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(err) => return Some(Err(Error::Io(IoError::from_walk(err)))),
            };

            // Directories, sockets, fifos and (unfollowed) symlinks are skipped
            if !entry.file_type().is_file() {
                continue;
            }

            let relative_path = self.relative(entry.path());
            return Some(Ok(WalkStep::File(WalkedFile {
                path: entry.into_path(),
                relative_path,
            })));
        }
    }
}
