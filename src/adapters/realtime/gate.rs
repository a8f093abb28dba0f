//! Per-session gate that orders cache work against teardown.

use std::sync::{Mutex, PoisonError};

/// Guards side effects of one session.
///
/// Every invalidation and state write made on behalf of a session runs
/// inside [`SessionGate::run`]. [`SessionGate::close`] takes the same lock,
/// so once `close` returns no further work from that session can happen,
/// even if its task is still draining a frame.
#[derive(Debug)]
pub struct SessionGate {
    open: Mutex<bool>,
}

impl SessionGate {
    pub fn new() -> Self {
        Self {
            open: Mutex::new(true),
        }
    }

    /// Run `f` if the session is still open. Returns `None` otherwise.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let open = self.open.lock().unwrap_or_else(PoisonError::into_inner);
        if *open {
            Some(f())
        } else {
            None
        }
    }

    /// Close the gate. Waits for any in-flight `run` to finish.
    pub fn close(&self) {
        let mut open = self.open.lock().unwrap_or_else(PoisonError::into_inner);
        *open = false;
    }

    pub fn is_open(&self) -> bool {
        *self.open.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SessionGate {
    fn default() -> Self {
        Self::new()
    }
}
