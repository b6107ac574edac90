//! Mode-dependent access to shared lease tables.

use std::sync::atomic::{AtomicBool, Ordering};

use lease6_types::{Result, ThreadingMode, error::ConcurrentAccessSnafu};
use parking_lot::RwLock;

/// Owns shared state and applies the configured [`ThreadingMode`].
///
/// In multi-threaded mode every mutation holds the exclusive lock for the
/// whole call and reads share the lock. In single-threaded mode no lock is
/// ever waited on: access is attempted without blocking, and if another
/// thread holds a conflicting lock the call fails with
/// [`LeaseError::ConcurrentAccess`](lease6_types::LeaseError::ConcurrentAccess).
#[derive(Debug)]
pub struct ConcurrencyGuard<T> {
    inner: RwLock<T>,
    multi_threaded: AtomicBool,
}

impl<T> ConcurrencyGuard<T> {
    /// Wraps `inner` under the given mode.
    pub fn new(inner: T, mode: ThreadingMode) -> Self {
        Self { inner: RwLock::new(inner), multi_threaded: AtomicBool::new(mode.is_multi_threaded()) }
    }

    /// Current threading mode.
    pub fn mode(&self) -> ThreadingMode {
        ThreadingMode::from_multi_threaded(self.multi_threaded.load(Ordering::Acquire))
    }

    /// Switches the threading mode.
    ///
    /// Intended for test harnesses that replay one scenario in both modes.
    /// Switching while other threads have calls in flight is a caller error:
    /// those calls complete under whichever mode they observed on entry.
    pub fn set_mode(&self, mode: ThreadingMode) {
        self.multi_threaded.store(mode.is_multi_threaded(), Ordering::Release);
    }

    /// Runs `f` with shared access.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentAccess` in single-threaded mode when a writer is
    /// active on another thread.
    pub fn read<R>(&self, operation: &'static str, f: impl FnOnce(&T) -> R) -> Result<R> {
        if self.mode().is_multi_threaded() {
            return Ok(f(&self.inner.read()));
        }

        match self.inner.try_read() {
            Some(guard) => Ok(f(&guard)),
            None => {
                tracing::warn!(operation, "Concurrent read on single-threaded lease store");
                ConcurrentAccessSnafu { operation }.fail()
            },
        }
    }

    /// Runs `f` with exclusive access.
    ///
    /// # Errors
    ///
    /// Returns `ConcurrentAccess` in single-threaded mode when any other
    /// thread holds the tables.
    pub fn write<R>(&self, operation: &'static str, f: impl FnOnce(&mut T) -> R) -> Result<R> {
        if self.mode().is_multi_threaded() {
            return Ok(f(&mut self.inner.write()));
        }

        match self.inner.try_write() {
            Some(mut guard) => Ok(f(&mut guard)),
            None => {
                tracing::warn!(operation, "Concurrent write on single-threaded lease store");
                ConcurrentAccessSnafu { operation }.fail()
            },
        }
    }
}
