//! Utility functions and conversions for FFI
//!
//! Panic catching, pointer validation, string conversion and the mapping from
//! Rust errors onto status codes.

use crate::Error;
use crate::ffi::types::HashErrorCode;
use crate::ffi_memory::ffi_allocate_string;
use crate::log_channel::LogLine;
use std::ffi::{CStr, c_char};
use std::panic::{AssertUnwindSafe, catch_unwind};

/// Macro to wrap FFI functions with panic catching
#[macro_export]
macro_rules! ffi_catch_panic {
    ($($body:tt)*) => {{
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| { $($body)* })) {
            Ok(result) => result,
            Err(_) => $crate::ffi::types::HashErrorCode::Exception,
        }
    }};
}

/// Validate a C string pointer
#[inline]
pub(crate) fn validate_c_str(ptr: *const c_char) -> bool {
    !ptr.is_null()
}

/// Validate a mutable pointer is not null
#[inline]
pub(crate) fn validate_mut_ptr<T>(ptr: *mut T) -> bool {
    !ptr.is_null()
}

/// Convert Rust error to FFI result code
pub(crate) fn error_to_result(error: &Error) -> HashErrorCode {
    use crate::error::{EngineError, ValidationError};

    match error {
        Error::Io(_) => HashErrorCode::IoFailure,
        Error::Validation(val_err) => match val_err {
            ValidationError::InvalidPath { .. } => HashErrorCode::InvalidPath,
            _ => HashErrorCode::InvalidArgument,
        },
        Error::Engine(engine_err) => match engine_err {
            EngineError::NotInitialized => HashErrorCode::NotInitialized,
            EngineError::AlreadyInitialized => HashErrorCode::AlreadyInitialized,
            EngineError::UnknownJob { .. } => HashErrorCode::UnknownJob,
        },
        Error::Internal(_) => HashErrorCode::General,
    }
}

/// Convert a C path argument; invalid UTF-8 counts as an invalid path
pub(crate) fn c_str_to_string(s: *const c_char) -> Result<String, HashErrorCode> {
    if !validate_c_str(s) {
        return Err(HashErrorCode::NullArgument);
    }

    // Wrap in catch_unwind to handle potential panics from invalid memory
    match catch_unwind(AssertUnwindSafe(|| unsafe {
        CStr::from_ptr(s)
            .to_str()
            .map(|s| s.to_string())
            .map_err(|_| HashErrorCode::InvalidPath)
    })) {
        Ok(result) => result,
        Err(_) => Err(HashErrorCode::InvalidArgument),
    }
}

/// Hand a dequeued line to C, writing the tracked pointer to `out`
///
/// Log lines never contain NUL, so only a failed allocation can lose one.
pub(crate) fn write_line(line: LogLine, out: *mut *mut c_char) -> HashErrorCode {
    let ptr = ffi_allocate_string(line.text());
    if ptr.is_null() {
        return HashErrorCode::AllocationFailure;
    }
    unsafe {
        *out = ptr;
    }
    HashErrorCode::Ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EngineError, IoError, ValidationError};
    use std::path::Path;

    #[test]
    fn test_error_mapping() {
        let cases = [
            (
                Error::Validation(ValidationError::invalid_path(Path::new("/x"), "missing")),
                HashErrorCode::InvalidPath,
            ),
            (
                Error::Validation(ValidationError::invalid_configuration("bad buffer size")),
                HashErrorCode::InvalidArgument,
            ),
            (
                Error::Engine(EngineError::unknown_job(9)),
                HashErrorCode::UnknownJob,
            ),
            (
                Error::Engine(EngineError::NotInitialized),
                HashErrorCode::NotInitialized,
            ),
            (
                Error::Io(IoError::from_std(std::io::Error::from(std::io::ErrorKind::NotFound))),
                HashErrorCode::IoFailure,
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error_to_result(&error), expected, "{error}");
        }
    }

    #[test]
    fn test_write_line_accepts_text_with_nul() {
        use crate::ffi_memory::ffi_free_string;
        use crate::log_channel::{LogChannel, LogRecord};
        use std::sync::Arc;
        use std::sync::atomic::AtomicU64;

        let channel = LogChannel::new(2, Arc::new(AtomicU64::new(1)));
        channel.push(&LogRecord::Start {
            root: "/tmp/odd\0root".into(),
        });

        let mut out: *mut c_char = std::ptr::null_mut();
        assert_eq!(write_line(channel.pop().unwrap(), &mut out), HashErrorCode::Ok);
        assert!(!out.is_null());
        let text = unsafe { CStr::from_ptr(out) }.to_str().unwrap().to_string();
        assert_eq!(text, "2: START /tmp/odd root");
        assert!(unsafe { ffi_free_string(out) });
    }

    #[test]
    fn test_c_str_conversion() {
        assert_eq!(
            c_str_to_string(std::ptr::null()),
            Err(HashErrorCode::NullArgument)
        );

        let valid = c"/tmp/dir";
        assert_eq!(c_str_to_string(valid.as_ptr()).unwrap(), "/tmp/dir");

        let invalid = [0xffu8, 0xfe, 0];
        assert_eq!(
            c_str_to_string(invalid.as_ptr() as *const c_char),
            Err(HashErrorCode::InvalidPath)
        );
    }
}
