//! Internal library error types

use thiserror::Error;

/// Internal library errors
#[derive(Error, Debug)]
pub enum InternalError {
    /// Worker runtime could not be created
    #[error("Worker runtime error: {message}")]
    Runtime { message: String },

    /// A job's worker panicked before reaching a terminal state
    #[error("Worker for job {code} panicked")]
    WorkerPanicked { code: usize },
}

impl InternalError {
    /// Create a runtime error
    pub fn runtime(message: impl Into<String>) -> Self {
        Self::Runtime {
            message: message.into(),
        }
    }

    pub fn worker_panicked(code: usize) -> Self {
        Self::WorkerPanicked { code }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_runtime_error() {
        let error = InternalError::runtime("no threads");
        assert!(error.to_string().contains("Worker runtime error"));
        assert!(error.to_string().contains("no threads"));
    }

    #[test]
    fn test_worker_panicked_error() {
        let error = InternalError::worker_panicked(7);
        assert_eq!(error.to_string(), "Worker for job 7 panicked");
    }
}
