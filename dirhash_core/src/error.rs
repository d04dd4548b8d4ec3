//! Error types for the dirhash engine
//!
//! Errors are organized into categories so the C boundary can map each of
//! them onto a single status code.

use thiserror::Error;

pub mod engine;
pub mod internal;
pub mod io;
pub mod validation;

pub use self::engine::EngineError;
pub use self::io::{IoError, IoErrorKind};
pub use self::validation::ValidationError;
pub use internal::InternalError;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the engine
///
/// Errors are categorized into four main types:
/// - I/O errors: reading files or enumerating directories
/// - Validation errors: bad paths, bad configuration
/// - Engine errors: lifecycle misuse and unknown job codes
/// - Internal errors: runtime failures and worker panics
#[derive(Error, Debug)]
pub enum Error {
    /// I/O related errors
    #[error(transparent)]
    Io(#[from] IoError),

    /// Validation related errors
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Lifecycle and job lookup errors
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Internal library errors
    #[error(transparent)]
    Internal(#[from] InternalError),
}

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Self::Io(IoError::from_std(source))
    }
}

impl From<walkdir::Error> for Error {
    fn from(err: walkdir::Error) -> Self {
        Self::Io(IoError::from_walk(err))
    }
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Validation(ValidationError::invalid_configuration(&err.to_string()))
    }
}
