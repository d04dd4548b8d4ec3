//! C-compatible type definitions for FFI

use crate::job::JobState;

/* ========================================================================== */
/*                              Type Definitions                               */
/* ========================================================================== */

/// Status codes returned by every `Hash*` function
///
/// Values 0 through 8 match the original `HASH_ERROR_*` constants.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashErrorCode {
    Ok = 0,
    General = 1,
    /// A panic was caught at the boundary
    Exception = 2,
    AllocationFailure = 3,
    NoMoreLines = 4,
    InvalidArgument = 5,
    NullArgument = 6,
    NotInitialized = 7,
    AlreadyInitialized = 8,
    InvalidPath = 9,
    UnknownJob = 10,
    IoFailure = 11,
}

/// Job lifecycle state as seen from C
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashJobStateCode {
    Pending = 0,
    Running = 1,
    Stopping = 2,
    Completed = 3,
    Failed = 4,
    Stopped = 5,
}

impl From<JobState> for HashJobStateCode {
    fn from(state: JobState) -> Self {
        match state {
            JobState::Pending => HashJobStateCode::Pending,
            JobState::Running => HashJobStateCode::Running,
            JobState::Stopping => HashJobStateCode::Stopping,
            JobState::Completed => HashJobStateCode::Completed,
            JobState::Failed => HashJobStateCode::Failed,
            JobState::Stopped => HashJobStateCode::Stopped,
        }
    }
}
