//! Static strings describing status codes and the library

use crate::ffi::types::HashErrorCode;
use std::ffi::c_char;

const VERSION_STRING: &str = concat!(env!("CARGO_PKG_VERSION"), "\0");

/// Get human-readable error description
#[unsafe(no_mangle)]
pub extern "C" fn HashErrorString(error: HashErrorCode) -> *const c_char {
    let msg = match error {
        HashErrorCode::Ok => "Success\0",
        HashErrorCode::General => "General error\0",
        HashErrorCode::Exception => "Internal exception\0",
        HashErrorCode::AllocationFailure => "Memory allocation failed\0",
        HashErrorCode::NoMoreLines => "No more log lines\0",
        HashErrorCode::InvalidArgument => "Invalid argument\0",
        HashErrorCode::NullArgument => "Null argument\0",
        HashErrorCode::NotInitialized => "Library not initialized\0",
        HashErrorCode::AlreadyInitialized => "Library already initialized\0",
        HashErrorCode::InvalidPath => "Path is not an accessible directory\0",
        HashErrorCode::UnknownJob => "Unknown job code\0",
        HashErrorCode::IoFailure => "I/O error\0",
    };
    msg.as_ptr() as *const c_char
}

/// Get library version string
#[unsafe(no_mangle)]
pub extern "C" fn HashGetVersion() -> *const c_char {
    VERSION_STRING.as_ptr() as *const c_char
}
