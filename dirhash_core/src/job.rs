//! Directory hashing jobs
//!
//! A [`Job`] is shared between exactly one worker (which walks and hashes the
//! tree) and any number of callers (status queries, log drains, stop
//! requests). The state lives in an atomic so status polling never blocks on
//! the worker; the outcome fields sit behind a mutex that is also held while
//! the terminal state is published, so a caller that observes a terminal
//! state always finds the digest or error and the closing log line in place.

use crate::hashing::{Digest, HashAlgorithm};
use crate::log_channel::{LogChannel, LogRecord};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicU64, AtomicUsize, Ordering};
use tokio::sync::watch;

mod manager;
mod worker;

pub use manager::JobManager;

/// Lifecycle state of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum JobState {
    Pending = 0,
    Running = 1,
    Stopping = 2,
    Completed = 3,
    Failed = 4,
    Stopped = 5,
}

impl JobState {
    /// Terminal states admit no further transition
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Completed | JobState::Failed | JobState::Stopped
        )
    }

    /// What the C boundary reports as "still running"
    pub fn is_running(self) -> bool {
        !self.is_terminal()
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => JobState::Pending,
            1 => JobState::Running,
            2 => JobState::Stopping,
            3 => JobState::Completed,
            4 => JobState::Failed,
            _ => JobState::Stopped,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobState::Pending => "pending",
            JobState::Running => "running",
            JobState::Stopping => "stopping",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Cheap snapshot returned by status queries
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub state: JobState,
    /// Set only when `state` is `Failed`
    pub error: Option<String>,
}

/// Detailed snapshot of a job
#[derive(Debug, Clone, Serialize)]
pub struct JobSummary {
    pub code: usize,
    pub root: PathBuf,
    pub state: JobState,
    pub files_hashed: usize,
    pub bytes_hashed: u64,
    /// Uppercase hex, set only when `state` is `Completed`
    pub aggregate_digest: Option<String>,
    pub error: Option<String>,
    pub lines_produced: u64,
    pub lines_queued: usize,
}

/// How a worker ended
#[derive(Debug)]
pub(crate) enum Finish {
    Completed { digest: Digest, bytes: u64 },
    Failed(String),
    Stopped,
}

#[derive(Debug, Default)]
struct JobOutcome {
    aggregate_digest: Option<Digest>,
    error: Option<String>,
}

/// One asynchronous directory-hashing operation
pub struct Job {
    code: usize,
    root: PathBuf,
    algorithm: HashAlgorithm,
    state: AtomicU8,
    cancel: AtomicBool,
    outcome: Mutex<JobOutcome>,
    files_hashed: AtomicUsize,
    bytes_hashed: AtomicU64,
    log: LogChannel,
    state_tx: watch::Sender<JobState>,
}

impl Job {
    pub(crate) fn new(code: usize, root: &Path, algorithm: HashAlgorithm, log: LogChannel) -> Self {
        let (state_tx, _) = watch::channel(JobState::Pending);
        Self {
            code,
            root: root.to_path_buf(),
            algorithm,
            state: AtomicU8::new(JobState::Pending as u8),
            cancel: AtomicBool::new(false),
            outcome: Mutex::new(JobOutcome::default()),
            files_hashed: AtomicUsize::new(0),
            bytes_hashed: AtomicU64::new(0),
            log,
            state_tx,
        }
    }

    pub fn code(&self) -> usize {
        self.code
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn state(&self) -> JobState {
        JobState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn log(&self) -> &LogChannel {
        &self.log
    }

    pub(crate) fn cancel_flag(&self) -> &AtomicBool {
        &self.cancel
    }

    pub(crate) fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<JobState> {
        self.state_tx.subscribe()
    }

    fn lock_outcome(&self) -> std::sync::MutexGuard<'_, JobOutcome> {
        self.outcome.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn publish(&self, state: JobState) {
        self.state.store(state as u8, Ordering::Release);
        self.state_tx.send_replace(state);
    }

    /// Pending → Running
    pub(crate) fn mark_running(&self) {
        let _outcome = self.lock_outcome();
        if self.state() == JobState::Pending {
            self.publish(JobState::Running);
        }
    }

    /// Ask the worker to stop at the next entry
    ///
    /// Returns true when this call moved the job into `Stopping`. Terminal
    /// jobs are left untouched.
    pub fn request_stop(&self) -> bool {
        let _outcome = self.lock_outcome();
        let state = self.state();
        if state.is_terminal() {
            return false;
        }
        self.cancel.store(true, Ordering::Release);
        if state == JobState::Running {
            self.publish(JobState::Stopping);
            return true;
        }
        false
    }

    pub(crate) fn record_file(&self, bytes: u64) {
        self.files_hashed.fetch_add(1, Ordering::Relaxed);
        self.bytes_hashed.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Move into exactly one terminal state and emit the closing line
    ///
    /// A completed walk that raced with a stop request ends as `Stopped`: the
    /// caller already saw `Stopping` and the flag was set before finalizing.
    pub(crate) fn finish(&self, finish: Finish) -> JobState {
        let mut outcome = self.lock_outcome();
        let current = self.state();
        if current.is_terminal() {
            return current;
        }

        let files = self.files_hashed.load(Ordering::Relaxed);
        let finish = match finish {
            Finish::Completed { .. } if self.cancel.load(Ordering::Acquire) => Finish::Stopped,
            other => other,
        };

        let final_state = match finish {
            Finish::Completed { digest, bytes } => {
                self.log.push(&LogRecord::Done {
                    algorithm: self.algorithm,
                    digest: digest.clone(),
                    files,
                    bytes,
                });
                outcome.aggregate_digest = Some(digest);
                JobState::Completed
            }
            Finish::Failed(message) => {
                self.log.push(&LogRecord::Failed {
                    message: message.clone(),
                });
                outcome.error = Some(message);
                JobState::Failed
            }
            Finish::Stopped => {
                self.log.push(&LogRecord::Stopped { files });
                JobState::Stopped
            }
        };

        self.publish(final_state);
        final_state
    }

    /// Lock-light status snapshot
    pub fn status(&self) -> JobStatus {
        let state = self.state();
        let error = if state == JobState::Failed {
            self.lock_outcome().error.clone()
        } else {
            None
        };
        JobStatus { state, error }
    }

    pub fn summary(&self) -> JobSummary {
        let outcome = self.lock_outcome();
        JobSummary {
            code: self.code,
            root: self.root.clone(),
            state: self.state(),
            files_hashed: self.files_hashed.load(Ordering::Relaxed),
            bytes_hashed: self.bytes_hashed.load(Ordering::Relaxed),
            aggregate_digest: outcome.aggregate_digest.as_ref().map(Digest::to_hex),
            error: outcome.error.clone(),
            lines_produced: self.log.produced(),
            lines_queued: self.log.len(),
        }
    }
}

impl fmt::Debug for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Job")
            .field("code", &self.code)
            .field("root", &self.root)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hashing::HashCalculator;
    use std::sync::Arc;

    fn job() -> Job {
        let log = LogChannel::new(1, Arc::new(AtomicU64::new(1)));
        Job::new(1, Path::new("/r"), HashAlgorithm::MD5, log)
    }

    #[test]
    fn test_happy_path_transitions() {
        let job = job();
        assert_eq!(job.state(), JobState::Pending);
        job.mark_running();
        assert_eq!(job.state(), JobState::Running);

        let digest = HashCalculator::default().calculate_bytes(b"x").digest;
        let state = job.finish(Finish::Completed { digest, bytes: 1 });
        assert_eq!(state, JobState::Completed);
        assert!(job.summary().aggregate_digest.is_some());
        assert!(job.log().pop().unwrap().text().starts_with("1: DONE md5:"));
    }

    #[test]
    fn test_single_terminal_state() {
        let job = job();
        job.mark_running();
        assert_eq!(job.finish(Finish::Failed("boom".into())), JobState::Failed);
        assert_eq!(job.finish(Finish::Stopped), JobState::Failed);
        assert_eq!(job.log().len(), 1);
        assert_eq!(job.status().error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_stop_request_transitions() {
        let job = job();
        job.mark_running();
        assert!(job.request_stop());
        assert_eq!(job.state(), JobState::Stopping);
        assert!(!job.request_stop());

        let digest = HashCalculator::default().calculate_bytes(b"").digest;
        // A completion racing the stop request still ends as Stopped
        assert_eq!(
            job.finish(Finish::Completed { digest, bytes: 0 }),
            JobState::Stopped
        );
        assert!(job.summary().aggregate_digest.is_none());
        assert!(!job.request_stop());
        assert_eq!(job.state(), JobState::Stopped);
    }

    #[test]
    fn test_state_watch_sees_terminal() {
        let job = job();
        let rx = job.subscribe();
        job.mark_running();
        job.finish(Finish::Stopped);
        assert_eq!(*rx.borrow(), JobState::Stopped);
    }
}
