//! Leak detector for resources that must be released explicitly.

use std::sync::atomic::{AtomicBool, Ordering};

use tracing::warn;

/// Tracks whether an explicit release method was called.
///
/// Armed on creation, disarmed by [`close`](CloseGuard::close). Owners call
/// [`warn_if_open`](CloseGuard::warn_if_open) from their `Drop` impl; in debug
/// builds a still-armed guard logs a warning naming the method that should
/// have been called. Release builds stay silent.
#[derive(Debug)]
pub(crate) struct CloseGuard {
    armed: AtomicBool,
    close_method: &'static str,
}

impl CloseGuard {
    /// Arm a guard that expects `close_method` to be called.
    pub(crate) fn open(close_method: &'static str) -> Self {
        Self {
            armed: AtomicBool::new(true),
            close_method,
        }
    }

    /// Disarm the guard. Returns `true` if it was armed.
    pub(crate) fn close(&self) -> bool {
        self.armed.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn is_open(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// Report a leak if the guard is still armed (debug builds only).
    pub(crate) fn warn_if_open(&self, resource: &str) {
        if cfg!(debug_assertions) && self.is_open() {
            warn!(
                resource,
                method = self.close_method,
                "resource dropped without calling {}()",
                self.close_method
            );
        }
    }
}
