//! Directory Hash Engine Core Library
//!
//! A background, cancellable hashing service over directory trees. Jobs are
//! started on an [`Engine`], run on their own worker task, report progress
//! as log lines and end with an aggregate digest of the whole tree. The same
//! engine is exposed to C through the [`ffi`] module.

pub mod config;
pub mod engine;
pub mod error;
pub mod ffi;
pub mod ffi_memory;
pub mod hashing;
pub mod job;
pub mod log_channel;
pub mod walker;

// Re-export main types
pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{Error, Result};
pub use hashing::{Digest, HashAlgorithm, HashCalculator, HashResult};
pub use job::{JobManager, JobState, JobStatus, JobSummary};
pub use log_channel::{LogLine, LogRecord};
