//! Job control entry points

use crate::ffi::handles::with_engine;
use crate::ffi::helpers::{c_str_to_string, error_to_result, validate_mut_ptr};
use crate::ffi::types::{HashErrorCode, HashJobStateCode};
use crate::ffi_catch_panic;
use std::ffi::c_char;

/// Start hashing the directory tree at `path`
///
/// On success `*code` receives the new job's code, which is never 0.
#[unsafe(no_mangle)]
pub extern "C" fn HashDirectory(path: *const c_char, code: *mut usize) -> HashErrorCode {
    ffi_catch_panic!({
        if !validate_mut_ptr(code) {
            return HashErrorCode::NullArgument;
        }

        let path = match c_str_to_string(path) {
            Ok(path) => path,
            Err(e) => return e,
        };

        with_engine(|engine| match engine.start_directory_job(&path) {
            Ok(job_code) => {
                unsafe {
                    *code = job_code;
                }
                HashErrorCode::Ok
            }
            Err(e) => error_to_result(&e),
        })
    })
}

/// Report whether a job is still running
///
/// `Stopping` counts as running; any terminal state does not.
#[unsafe(no_mangle)]
pub extern "C" fn HashStatus(code: usize, running: *mut bool) -> HashErrorCode {
    ffi_catch_panic!({
        if !validate_mut_ptr(running) {
            return HashErrorCode::NullArgument;
        }

        with_engine(|engine| match engine.query_status(code) {
            Ok(status) => {
                unsafe {
                    *running = status.state.is_running();
                }
                HashErrorCode::Ok
            }
            Err(e) => error_to_result(&e),
        })
    })
}

/// Report the full lifecycle state of a job
#[unsafe(no_mangle)]
pub extern "C" fn HashJobState(code: usize, state: *mut HashJobStateCode) -> HashErrorCode {
    ffi_catch_panic!({
        if !validate_mut_ptr(state) {
            return HashErrorCode::NullArgument;
        }

        with_engine(|engine| match engine.query_status(code) {
            Ok(status) => {
                unsafe {
                    *state = status.state.into();
                }
                HashErrorCode::Ok
            }
            Err(e) => error_to_result(&e),
        })
    })
}

/// Ask a job to stop; stopping a finished job succeeds and changes nothing
#[unsafe(no_mangle)]
pub extern "C" fn HashStop(code: usize) -> HashErrorCode {
    ffi_catch_panic!({
        with_engine(|engine| match engine.request_stop(code) {
            Ok(()) => HashErrorCode::Ok,
            Err(e) => error_to_result(&e),
        })
    })
}
