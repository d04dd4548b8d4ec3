//! Test utilities for the directory hash engine
//!
//! Builders for on-disk directory trees and helpers for polling jobs and
//! draining their log lines.

pub mod builders;
pub mod polling;

// Re-export commonly used types
pub use builders::{TestTree, TestTreeBuilder};
pub use polling::{drain_job_lines, wait_until, wait_until_done};
