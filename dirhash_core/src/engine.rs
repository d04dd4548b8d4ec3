//! Engine context
//!
//! An [`Engine`] owns the job table, the worker runtime and the shared log
//! stamp counter. Everything a job allocates lives inside the engine and is
//! released by [`Engine::terminate`] (or by dropping the engine).

use crate::config::EngineConfig;
use crate::error::Result;
use crate::job::{JobManager, JobState, JobStatus, JobSummary};
use crate::log_channel::LogLine;
use log::{debug, info};
use std::path::Path;
use std::time::Duration;

/// Install the process logger once; later calls are ignored
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .try_init();
}

/// Background directory-hashing engine
#[derive(Debug)]
pub struct Engine {
    jobs: JobManager,
}

impl Engine {
    /// Create an engine with explicit configuration
    pub fn new(config: EngineConfig) -> Result<Self> {
        init_logging();
        let jobs = JobManager::new(config)?;
        info!(
            "Engine ready (algorithm={}, worker_threads={})",
            jobs.config().algorithm,
            jobs.config().worker_threads
        );
        Ok(Self { jobs })
    }

    /// Create an engine from layered configuration (file + environment)
    pub fn from_env() -> Result<Self> {
        Self::new(EngineConfig::load()?)
    }

    pub fn config(&self) -> &EngineConfig {
        self.jobs.config()
    }

    /// Start hashing the tree below `path`; returns the job code
    pub fn start_directory_job(&self, path: impl AsRef<Path>) -> Result<usize> {
        self.jobs.start(path.as_ref())
    }

    pub fn query_status(&self, code: usize) -> Result<JobStatus> {
        self.jobs.status(code)
    }

    pub fn summary(&self, code: usize) -> Result<JobSummary> {
        self.jobs.summary(code)
    }

    pub fn request_stop(&self, code: usize) -> Result<()> {
        self.jobs.request_stop(code)
    }

    /// Next line of one job, `None` when its queue is currently empty
    pub fn read_next_log_line(&self, code: usize) -> Result<Option<LogLine>> {
        self.jobs.read_next_line(code)
    }

    /// Oldest queued line of any job
    pub fn read_next_any_log_line(&self) -> Option<LogLine> {
        self.jobs.read_next_line_any()
    }

    pub fn wait(&self, code: usize, timeout: Duration) -> Result<JobState> {
        self.jobs.wait(code, timeout)
    }

    pub fn job_codes(&self) -> Vec<usize> {
        self.jobs.job_codes()
    }

    /// Stop all jobs, wait for their workers and release everything
    pub fn terminate(self) {
        debug!("Terminating engine with {} jobs", self.jobs.job_count());
        self.jobs.shutdown();
        info!("Engine terminated");
    }
}
