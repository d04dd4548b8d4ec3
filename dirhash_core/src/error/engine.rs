//! Engine lifecycle and job lookup errors

use thiserror::Error;

/// Errors raised by the engine facade and the job manager
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// An operation was attempted before `init` or after `terminate`
    #[error("Hash engine is not initialized")]
    NotInitialized,

    /// `init` was called on a live engine
    #[error("Hash engine is already initialized")]
    AlreadyInitialized,

    /// No job with this code exists
    #[error("Unknown job code {code}")]
    UnknownJob { code: usize },
}

impl EngineError {
    /// Create an unknown job error
    pub fn unknown_job(code: usize) -> Self {
        Self::UnknownJob { code }
    }
}
