//! C interface to the hash engine
//!
//! Entry points keep the original `Hash*` names and status code values so
//! existing C and ctypes clients link unchanged.
//!
//! # Safety
//!
//! - Null pointer validation for all pointer parameters
//! - Panic catching at FFI boundary using catch_unwind
//! - Returned strings are tracked; releasing one twice is a no-op
//!
//! No Rust panics can cross the FFI boundary - all are caught and
//! converted to `HashErrorCode::Exception`.

#![allow(clippy::not_unsafe_ptr_arg_deref)]
#![allow(non_snake_case)]

pub mod handles;
pub mod helpers;
pub mod lines;
pub mod memory;
pub mod operations;
pub mod results;
pub mod types;

pub use handles::{HashInit, HashTerminate};
pub use lines::{HashReadNextJobLogLine, HashReadNextLogLine};
pub use memory::HashFree;
pub use operations::{HashDirectory, HashJobState, HashStatus, HashStop};
pub use results::{HashErrorString, HashGetVersion};
pub use types::{HashErrorCode, HashJobStateCode};
