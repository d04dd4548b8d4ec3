//! Ownership tracking for strings handed across the C boundary
//!
//! Every log line returned to C is a `CString` released with `into_raw` and
//! recorded here. Releasing goes through the tracker first, so a pointer that
//! was never handed out, or was already released, is ignored instead of being
//! freed twice.

use log::warn;
use std::collections::HashMap;
use std::ffi::CString;
use std::os::raw::c_char;
use std::ptr;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Memory allocation tracking information
#[derive(Debug, Clone)]
pub struct AllocationInfo {
    /// Bytes including the NUL terminator
    pub size: usize,
}

// Global allocation tracker
lazy_static::lazy_static! {
    pub static ref ALLOCATION_TRACKER: AllocationTracker = AllocationTracker::new();
}

/// Tracks every string currently owned by C callers
pub struct AllocationTracker {
    allocations: Mutex<HashMap<usize, AllocationInfo>>,
    total_allocations: AtomicU64,
    total_deallocations: AtomicU64,
    ignored_releases: AtomicU64,
    current_allocated: AtomicUsize,
    peak_allocated: AtomicUsize,
}

/// Snapshot of the tracker counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationStats {
    pub total_allocations: u64,
    pub total_deallocations: u64,
    /// Release calls for pointers the tracker did not own
    pub ignored_releases: u64,
    pub current_allocated: usize,
    pub peak_allocated: usize,
    pub active_allocations: usize,
}

impl AllocationTracker {
    fn new() -> Self {
        Self {
            allocations: Mutex::new(HashMap::new()),
            total_allocations: AtomicU64::new(0),
            total_deallocations: AtomicU64::new(0),
            ignored_releases: AtomicU64::new(0),
            current_allocated: AtomicUsize::new(0),
            peak_allocated: AtomicUsize::new(0),
        }
    }

    /// Track a new allocation
    pub fn track_allocation(&self, ptr: *const u8, size: usize) {
        if ptr.is_null() {
            return;
        }

        let info = AllocationInfo { size };
        self.allocations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(ptr as usize, info);

        self.total_allocations.fetch_add(1, Ordering::Relaxed);
        let new_size = self.current_allocated.fetch_add(size, Ordering::AcqRel) + size;
        self.peak_allocated.fetch_max(new_size, Ordering::Relaxed);
    }

    /// Forget an allocation; `None` if the pointer is not currently tracked
    pub fn track_deallocation(&self, ptr: *const u8) -> Option<AllocationInfo> {
        if ptr.is_null() {
            return None;
        }

        let removed = self
            .allocations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&(ptr as usize));

        match removed {
            Some(info) => {
                self.total_deallocations.fetch_add(1, Ordering::Relaxed);
                self.current_allocated.fetch_sub(info.size, Ordering::AcqRel);
                Some(info)
            }
            None => {
                self.ignored_releases.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn is_tracked(&self, ptr: *const u8) -> bool {
        self.allocations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains_key(&(ptr as usize))
    }

    pub fn get_stats(&self) -> AllocationStats {
        let active_allocations = self
            .allocations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len();

        AllocationStats {
            total_allocations: self.total_allocations.load(Ordering::Relaxed),
            total_deallocations: self.total_deallocations.load(Ordering::Relaxed),
            ignored_releases: self.ignored_releases.load(Ordering::Relaxed),
            current_allocated: self.current_allocated.load(Ordering::Relaxed),
            peak_allocated: self.peak_allocated.load(Ordering::Relaxed),
            active_allocations,
        }
    }
}

/// Allocate a NUL-terminated copy of `s` owned by the C caller
///
/// Returns null if `s` contains an interior NUL.
pub fn ffi_allocate_string(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(c_str) => {
            let ptr = c_str.into_raw();
            ALLOCATION_TRACKER.track_allocation(ptr as *const u8, s.len() + 1);
            ptr
        }
        Err(_) => ptr::null_mut(),
    }
}

/// Free a string produced by [`ffi_allocate_string`]
///
/// Returns false, and frees nothing, for pointers the tracker does not own.
///
/// # Safety
///
/// A tracked pointer must not be used by the caller after this returns.
pub unsafe fn ffi_free_string(ptr: *mut c_char) -> bool {
    if ptr.is_null() {
        return false;
    }

    if ALLOCATION_TRACKER.track_deallocation(ptr as *const u8).is_none() {
        warn!("Ignoring release of unknown or already released pointer {ptr:p}");
        return false;
    }

    unsafe {
        let _ = CString::from_raw(ptr);
    }
    true
}
