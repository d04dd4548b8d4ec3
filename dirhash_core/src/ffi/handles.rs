//! Process-wide engine slot and lifecycle entry points
//!
//! The C API drives a single engine. Job calls hold the slot's read lock for
//! their (short, non-blocking) duration; `HashInit` and `HashTerminate` take
//! the write lock. Terminate moves the slot to `ShuttingDown` before it joins
//! the workers, so the lock is not held while waiting.

use crate::error::EngineError;
use crate::ffi::helpers::error_to_result;
use crate::{Engine, Result};
use crate::ffi::types::HashErrorCode;
use crate::ffi_catch_panic;
use log::debug;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Lifecycle of the process-wide engine
pub(crate) enum EngineSlot {
    Uninitialized,
    Ready(Engine),
    ShuttingDown,
}

lazy_static::lazy_static! {
    pub(crate) static ref ENGINE: RwLock<EngineSlot> = RwLock::new(EngineSlot::Uninitialized);
}

fn read_slot() -> RwLockReadGuard<'static, EngineSlot> {
    ENGINE.read().unwrap_or_else(|e| e.into_inner())
}

fn write_slot() -> RwLockWriteGuard<'static, EngineSlot> {
    ENGINE.write().unwrap_or_else(|e| e.into_inner())
}

/// Run `f` against the live engine, or report `NotInitialized`
pub(crate) fn with_engine<F>(f: F) -> HashErrorCode
where
    F: FnOnce(&Engine) -> HashErrorCode,
{
    match &*read_slot() {
        EngineSlot::Ready(engine) => f(engine),
        EngineSlot::Uninitialized | EngineSlot::ShuttingDown => HashErrorCode::NotInitialized,
    }
}

/// Initialize the hash engine
///
/// Configuration is read from `DIRHASH_CONFIG` and `DIRHASH_*` variables.
#[unsafe(no_mangle)]
pub extern "C" fn HashInit() -> HashErrorCode {
    ffi_catch_panic!({
        match install_engine(&mut write_slot()) {
            Ok(()) => HashErrorCode::Ok,
            Err(e) => {
                debug!("HashInit: {e}");
                error_to_result(&e)
            }
        }
    })
}

/// Build an engine from the environment into an empty slot
fn install_engine(slot: &mut EngineSlot) -> Result<()> {
    if !matches!(slot, EngineSlot::Uninitialized) {
        return Err(EngineError::AlreadyInitialized.into());
    }
    *slot = EngineSlot::Ready(Engine::from_env()?);
    Ok(())
}

/// Stop every job, wait for all workers and release the engine
#[unsafe(no_mangle)]
pub extern "C" fn HashTerminate() -> HashErrorCode {
    ffi_catch_panic!({
        let engine = {
            let mut slot = write_slot();
            match std::mem::replace(&mut *slot, EngineSlot::ShuttingDown) {
                EngineSlot::Ready(engine) => engine,
                other => {
                    *slot = other;
                    return HashErrorCode::NotInitialized;
                }
            }
        };

        debug!("HashTerminate: releasing engine");
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| engine.terminate()));
        *write_slot() = EngineSlot::Uninitialized;

        match outcome {
            Ok(()) => HashErrorCode::Ok,
            Err(_) => HashErrorCode::Exception,
        }
    })
}
