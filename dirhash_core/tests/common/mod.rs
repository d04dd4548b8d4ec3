//! Common test utilities for integration tests
//!
//! Helpers for driving the C interface from Rust. The C interface owns one
//! process-wide engine, so every test using it is marked `serial` and holds
//! an [`FfiSession`] that terminates the engine even when an assertion fails.

#![allow(dead_code)]

use dirhash_core::ffi::{
    HashErrorCode, HashFree, HashInit, HashReadNextJobLogLine, HashReadNextLogLine, HashStatus,
    HashTerminate,
};
use std::ffi::{CStr, CString, c_char};
use std::ptr;
use std::time::{Duration, Instant};

pub const TIMEOUT: Duration = Duration::from_secs(20);

/// Initialized C engine, terminated on drop
pub struct FfiSession;

impl FfiSession {
    pub fn start() -> Self {
        assert_eq!(HashInit(), HashErrorCode::Ok);
        FfiSession
    }
}

impl Drop for FfiSession {
    fn drop(&mut self) {
        let _ = HashTerminate();
    }
}

pub fn c_path(path: &str) -> CString {
    CString::new(path).unwrap()
}

/// Take ownership of a returned line: copy it and release the original
pub fn take_line(ptr: *mut c_char) -> String {
    assert!(!ptr.is_null());
    let text = unsafe { CStr::from_ptr(ptr) }.to_str().unwrap().to_string();
    HashFree(ptr.cast());
    text
}

/// Poll `HashStatus` until the job is no longer running
pub fn wait_done(code: usize) -> bool {
    let deadline = Instant::now() + TIMEOUT;
    let mut running = true;
    while Instant::now() < deadline {
        assert_eq!(HashStatus(code, &mut running), HashErrorCode::Ok);
        if !running {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    false
}

/// Drain the cross-job queue
pub fn drain_all() -> Vec<String> {
    let mut lines = Vec::new();
    let mut line: *mut c_char = ptr::null_mut();
    while HashReadNextLogLine(&mut line) == HashErrorCode::Ok {
        lines.push(take_line(line));
        line = ptr::null_mut();
    }
    lines
}

/// Drain one job's queue
pub fn drain_job(code: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line: *mut c_char = ptr::null_mut();
    while HashReadNextJobLogLine(code, &mut line) == HashErrorCode::Ok {
        lines.push(take_line(line));
        line = ptr::null_mut();
    }
    lines
}
