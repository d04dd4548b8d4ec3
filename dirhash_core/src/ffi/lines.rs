//! Log line entry points
//!
//! Each returned line is owned by the caller and must be released with
//! `HashFree`.

use crate::ffi::handles::with_engine;
use crate::ffi::helpers::{error_to_result, validate_mut_ptr, write_line};
use crate::ffi::types::HashErrorCode;
use crate::ffi_catch_panic;
use std::ffi::c_char;

/// Dequeue the oldest pending line across all jobs
#[unsafe(no_mangle)]
pub extern "C" fn HashReadNextLogLine(line: *mut *mut c_char) -> HashErrorCode {
    ffi_catch_panic!({
        if !validate_mut_ptr(line) {
            return HashErrorCode::NullArgument;
        }

        with_engine(|engine| match engine.read_next_any_log_line() {
            Some(next) => write_line(next, line),
            None => HashErrorCode::NoMoreLines,
        })
    })
}

/// Dequeue the next line of one job
#[unsafe(no_mangle)]
pub extern "C" fn HashReadNextJobLogLine(code: usize, line: *mut *mut c_char) -> HashErrorCode {
    ffi_catch_panic!({
        if !validate_mut_ptr(line) {
            return HashErrorCode::NullArgument;
        }

        with_engine(|engine| match engine.read_next_log_line(code) {
            Ok(Some(next)) => write_line(next, line),
            Ok(None) => HashErrorCode::NoMoreLines,
            Err(e) => error_to_result(&e),
        })
    })
}
