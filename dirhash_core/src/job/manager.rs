//! Job table and worker runtime

use super::{Job, JobState, JobStatus, JobSummary, worker};
use crate::config::EngineConfig;
use crate::error::{EngineError, Error, InternalError, Result};
use crate::log_channel::{LogChannel, LogLine};
use crate::walker::validate_root;
use log::{debug, warn};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;

/// Owns every job created by one engine and the runtime their workers run on
///
/// Blocking operations (`wait`, `shutdown` and dropping the manager) drive the
/// internal runtime and must not be called from inside an async context.
pub struct JobManager {
    config: EngineConfig,
    runtime: Runtime,
    jobs: RwLock<HashMap<usize, Arc<Job>>>,
    workers: Mutex<HashMap<usize, JoinHandle<JobState>>>,
    next_code: AtomicUsize,
    stamps: Arc<AtomicU64>,
    drain: Mutex<()>,
    closed: AtomicBool,
}

impl JobManager {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let config = config.normalized();
        let runtime = Builder::new_multi_thread()
            .worker_threads(config.worker_threads)
            .thread_name("dirhash-worker")
            .enable_all()
            .build()
            .map_err(|e| Error::Internal(InternalError::runtime(e.to_string())))?;

        Ok(Self {
            config,
            runtime,
            jobs: RwLock::new(HashMap::new()),
            workers: Mutex::new(HashMap::new()),
            next_code: AtomicUsize::new(1),
            stamps: Arc::new(AtomicU64::new(1)),
            drain: Mutex::new(()),
            closed: AtomicBool::new(false),
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn job(&self, code: usize) -> Result<Arc<Job>> {
        self.jobs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&code)
            .cloned()
            .ok_or(Error::Engine(EngineError::unknown_job(code)))
    }

    /// Validate `path`, register a job and start its worker
    ///
    /// Returns as soon as the worker is spawned; the job is already `Running`.
    pub fn start(&self, path: &Path) -> Result<usize> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Error::Engine(EngineError::NotInitialized));
        }

        let root = validate_root(path)?;
        let code = self.next_code.fetch_add(1, Ordering::SeqCst);
        let log = LogChannel::new(code, Arc::clone(&self.stamps));
        let job = Arc::new(Job::new(code, &root, self.config.algorithm, log));

        self.jobs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(code, Arc::clone(&job));
        job.mark_running();

        let config = self.config.clone();
        let worker_job = Arc::clone(&job);
        let handle = self
            .runtime
            .spawn_blocking(move || worker::run(&worker_job, &config));
        self.workers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(code, handle);

        debug!("Started job {code} for {}", root.display());
        Ok(code)
    }

    pub fn status(&self, code: usize) -> Result<JobStatus> {
        Ok(self.job(code)?.status())
    }

    pub fn summary(&self, code: usize) -> Result<JobSummary> {
        Ok(self.job(code)?.summary())
    }

    /// Request cooperative cancellation; terminal jobs are left as they are
    pub fn request_stop(&self, code: usize) -> Result<()> {
        let job = self.job(code)?;
        if job.request_stop() {
            debug!("Stop requested for job {code}");
        }
        Ok(())
    }

    /// Dequeue the oldest line of one job
    pub fn read_next_line(&self, code: usize) -> Result<Option<LogLine>> {
        let job = self.job(code)?;
        let _drain = self.drain.lock().unwrap_or_else(|e| e.into_inner());
        Ok(job.log().pop())
    }

    /// Dequeue the queued line with the smallest stamp across all jobs
    ///
    /// Exact per job. Across jobs that are producing at the same moment the
    /// choice reflects the queues as they were when scanned.
    pub fn read_next_line_any(&self) -> Option<LogLine> {
        let _drain = self.drain.lock().unwrap_or_else(|e| e.into_inner());
        let jobs = self.jobs.read().unwrap_or_else(|e| e.into_inner());

        jobs.values()
            .filter_map(|job| job.log().front_stamp().map(|stamp| (stamp, job)))
            .min_by_key(|(stamp, _)| *stamp)
            .and_then(|(_, job)| job.log().pop())
    }

    /// Block until the job is terminal or `timeout` elapses
    ///
    /// Returns the last observed state.
    pub fn wait(&self, code: usize, timeout: Duration) -> Result<JobState> {
        let job = self.job(code)?;
        let mut rx = job.subscribe();
        let observed = self.runtime.block_on(async move {
            match tokio::time::timeout(timeout, rx.wait_for(|state| state.is_terminal())).await {
                Ok(Ok(state)) => Some(*state),
                _ => None,
            }
        });
        Ok(observed.unwrap_or_else(|| job.state()))
    }

    /// Codes of all known jobs in creation order
    pub fn job_codes(&self) -> Vec<usize> {
        let mut codes: Vec<usize> = self
            .jobs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .copied()
            .collect();
        codes.sort_unstable();
        codes
    }

    pub fn job_count(&self) -> usize {
        self.jobs.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Stop every job, join every worker and release the job table
    ///
    /// Idempotent. Afterwards `start` fails with `NotInitialized`.
    pub fn shutdown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let jobs: Vec<Arc<Job>> = self
            .jobs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .values()
            .cloned()
            .collect();
        for job in &jobs {
            job.request_stop();
        }

        let workers: Vec<(usize, JoinHandle<JobState>)> = self
            .workers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .drain()
            .collect();
        debug!("Joining {} workers", workers.len());

        self.runtime.block_on(async {
            for (code, handle) in workers {
                if let Err(e) = handle.await {
                    warn!("Worker for job {code} did not finish cleanly: {e}");
                }
            }
        });

        self.jobs.write().unwrap_or_else(|e| e.into_inner()).clear();
    }
}

impl Drop for JobManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for JobManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobManager")
            .field("config", &self.config)
            .field("jobs", &self.job_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const WAIT: Duration = Duration::from_secs(10);

    fn manager() -> JobManager {
        JobManager::new(EngineConfig::test()).unwrap()
    }

    fn tree() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("a.txt"), "x").unwrap();
        fs::write(temp_dir.path().join("b.txt"), "y").unwrap();
        temp_dir
    }

    #[test]
    fn test_codes_are_unique_and_nonzero() {
        let manager = manager();
        let temp_dir = tree();
        let first = manager.start(temp_dir.path()).unwrap();
        let second = manager.start(temp_dir.path()).unwrap();
        assert_ne!(first, 0);
        assert_ne!(first, second);
        assert_eq!(manager.job_codes(), vec![first, second]);
    }

    #[test]
    fn test_invalid_path_is_rejected() {
        let manager = manager();
        let err = manager.start(Path::new("/non/existing/dir")).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(manager.job_count(), 0);
    }

    #[test]
    fn test_unknown_code() {
        let manager = manager();
        assert!(matches!(
            manager.status(42),
            Err(Error::Engine(EngineError::UnknownJob { code: 42 }))
        ));
        assert!(manager.request_stop(42).is_err());
        assert!(manager.read_next_line(42).is_err());
    }

    #[test]
    fn test_wait_reaches_completed() {
        let manager = manager();
        let temp_dir = tree();
        let code = manager.start(temp_dir.path()).unwrap();
        assert_eq!(manager.wait(code, WAIT).unwrap(), JobState::Completed);

        let summary = manager.summary(code).unwrap();
        assert_eq!(summary.files_hashed, 2);
        assert_eq!(summary.lines_produced, 4);

        // Stop after completion is a no-op
        manager.request_stop(code).unwrap();
        assert_eq!(manager.status(code).unwrap().state, JobState::Completed);
    }

    #[test]
    fn test_cross_job_read_follows_stamps() {
        let manager = manager();
        let temp_dir = tree();
        let first = manager.start(temp_dir.path()).unwrap();
        manager.wait(first, WAIT).unwrap();
        let second = manager.start(temp_dir.path()).unwrap();
        manager.wait(second, WAIT).unwrap();

        let lines: Vec<LogLine> = std::iter::from_fn(|| manager.read_next_line_any()).collect();
        assert_eq!(lines.len(), 8);
        assert!(lines.windows(2).all(|w| w[0].stamp() < w[1].stamp()));
        assert!(lines[..4].iter().all(|line| line.code() == first));
        assert!(lines[4..].iter().all(|line| line.code() == second));
    }

    #[test]
    fn test_shutdown_rejects_new_jobs() {
        let manager = manager();
        let temp_dir = tree();
        manager.start(temp_dir.path()).unwrap();
        manager.shutdown();
        assert_eq!(manager.job_count(), 0);
        assert!(matches!(
            manager.start(temp_dir.path()),
            Err(Error::Engine(EngineError::NotInitialized))
        ));
    }
}
