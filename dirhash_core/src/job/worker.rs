//! Body of a job's background task

use super::{Finish, Job, JobState};
use crate::config::EngineConfig;
use crate::error::InternalError;
use crate::hashing::{AggregateBuilder, HashCalculator};
use crate::log_channel::LogRecord;
use crate::walker::{TreeWalker, WalkOptions, WalkStep};
use log::{debug, trace, warn};
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Walk and hash the job's tree, then finalize it
///
/// Always leaves the job in a terminal state, even if hashing panics.
pub(crate) fn run(job: &Job, config: &EngineConfig) -> JobState {
    let result = catch_unwind(AssertUnwindSafe(|| walk_and_hash(job, config)));

    let finish = match result {
        Ok(finish) => finish,
        Err(_) => {
            let error = InternalError::worker_panicked(job.code());
            warn!("{error}");
            Finish::Failed(error.to_string())
        }
    };

    let state = job.finish(finish);
    debug!("Job {} finished as {state}", job.code());
    state
}

fn walk_and_hash(job: &Job, config: &EngineConfig) -> Finish {
    job.log().push(&LogRecord::Start {
        root: job.root().display().to_string(),
    });

    let calculator = HashCalculator::with_buffer_size(job.algorithm(), config.read_buffer_size);
    let options = WalkOptions::default().with_follow_links(config.follow_links);
    let mut aggregate = AggregateBuilder::new(job.algorithm());

    for step in TreeWalker::new(job.root(), &options, job.cancel_flag()) {
        let file = match step {
            Ok(WalkStep::File(file)) => file,
            Ok(WalkStep::Cancelled) => {
                debug!(
                    "Job {} observed stop after {} files",
                    job.code(),
                    aggregate.file_count()
                );
                return Finish::Stopped;
            }
            Err(e) => return Finish::Failed(e.to_string()),
        };

        let result = match calculator.calculate_file(&file.path) {
            Ok(result) => result,
            Err(e) => return Finish::Failed(e.to_string()),
        };

        trace!("Job {} hashed {}", job.code(), file.path.display());
        job.log().push(&LogRecord::File {
            algorithm: result.algorithm,
            digest: result.digest.clone(),
            path: file.path.display().to_string(),
        });
        job.record_file(result.input_size);
        aggregate.add(file.aggregate_key(), result.digest, result.input_size);
    }

    let bytes = aggregate.total_bytes();
    Finish::Completed {
        digest: aggregate.finish(),
        bytes,
    }
}
