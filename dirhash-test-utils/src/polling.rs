//! Polling helpers for jobs driven through the engine

use dirhash_core::Engine;
use std::thread;
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(5);

/// Poll `condition` until it holds or `timeout` elapses
pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        if condition() {
            return true;
        }
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Poll a job's status until it is terminal
pub fn wait_until_done(engine: &Engine, code: usize, timeout: Duration) -> bool {
    wait_until(timeout, || {
        engine
            .query_status(code)
            .map(|status| status.state.is_terminal())
            .unwrap_or(false)
    })
}

/// Drain every currently queued line of one job
pub fn drain_job_lines(engine: &Engine, code: usize) -> Vec<String> {
    let mut lines = Vec::new();
    while let Ok(Some(line)) = engine.read_next_log_line(code) {
        lines.push(line.into_text());
    }
    lines
}
