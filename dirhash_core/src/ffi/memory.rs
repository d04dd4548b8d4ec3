//! Release of library-owned memory

use crate::ffi::helpers::validate_mut_ptr;
use crate::ffi_memory::ffi_free_string;
use std::ffi::{c_char, c_void};
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Free a line returned by `HashReadNextLogLine` or `HashReadNextJobLogLine`
///
/// Null, unknown and already released pointers are ignored.
#[unsafe(no_mangle)]
pub extern "C" fn HashFree(ptr: *mut c_void) {
    let _ = catch_unwind(AssertUnwindSafe(|| {
        if validate_mut_ptr(ptr) {
            unsafe {
                ffi_free_string(ptr as *mut c_char);
            }
        }
    }));
}
