//! Validation related error types

use std::path::PathBuf;
use thiserror::Error;

/// Validation and configuration errors
#[derive(Error, Debug)]
pub enum ValidationError {
    /// Invalid configuration
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// Path does not name an accessible directory
    #[error("Invalid path {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },
}

impl ValidationError {
    /// Create an invalid configuration error
    pub fn invalid_configuration(message: &str) -> Self {
        Self::InvalidConfiguration {
            message: message.to_string(),
        }
    }

    /// Create an invalid path error
    pub fn invalid_path(path: &std::path::Path, reason: &str) -> Self {
        Self::InvalidPath {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}
