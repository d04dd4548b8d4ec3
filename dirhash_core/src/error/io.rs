//! I/O related error types

use std::path::PathBuf;
use thiserror::Error;

/// I/O error with additional context
#[derive(Error, Debug)]
#[error("{}", format_io_error(self))]
pub struct IoError {
    /// The kind of I/O error
    pub kind: IoErrorKind,
    /// Path associated with the error (if any)
    pub path: Option<PathBuf>,
    /// Underlying I/O error (if any)
    #[source]
    pub source: Option<std::io::Error>,
}

/// Kind of I/O error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IoErrorKind {
    /// File or directory not found
    FileNotFound,
    /// Permission denied
    PermissionDenied,
    /// A symlink cycle was found while walking
    Loop,
    /// Generic I/O error
    Other,
}

impl IoError {
    /// Create an I/O error from a standard I/O error
    pub fn from_std(source: std::io::Error) -> Self {
        let kind = match source.kind() {
            std::io::ErrorKind::NotFound => IoErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => IoErrorKind::PermissionDenied,
            _ => IoErrorKind::Other,
        };

        Self {
            kind,
            path: None,
            source: Some(source),
        }
    }

    /// Create an I/O error from a directory walk failure
    pub fn from_walk(err: walkdir::Error) -> Self {
        let path = err.path().map(|p| p.to_path_buf());
        if err.loop_ancestor().is_some() {
            return Self {
                kind: IoErrorKind::Loop,
                path,
                source: None,
            };
        }

        match err.into_io_error() {
            Some(source) => {
                let mut error = Self::from_std(source);
                error.path = path;
                error
            }
            None => Self {
                kind: IoErrorKind::Other,
                path,
                source: None,
            },
        }
    }

    /// Create an I/O error with a path
    pub fn with_path(mut self, path: &std::path::Path) -> Self {
        self.path = Some(path.to_path_buf());
        self
    }
}

fn format_io_error(error: &IoError) -> String {
    match (&error.kind, &error.path) {
        (IoErrorKind::FileNotFound, Some(path)) => {
            format!("File not found: {}", path.display())
        }
        (IoErrorKind::FileNotFound, None) => "File not found".to_string(),
        (IoErrorKind::PermissionDenied, Some(path)) => {
            format!("Permission denied for: {}", path.display())
        }
        (IoErrorKind::PermissionDenied, None) => "Permission denied".to_string(),
        (IoErrorKind::Loop, Some(path)) => {
            format!("Symlink loop detected at: {}", path.display())
        }
        (IoErrorKind::Loop, None) => "Symlink loop detected".to_string(),
        (IoErrorKind::Other, path) => {
            let detail = match &error.source {
                Some(source) => format!("I/O error: {source}"),
                None => "I/O error".to_string(),
            };
            match path {
                Some(path) => format!("{detail} ({})", path.display()),
                None => detail,
            }
        }
    }
}
