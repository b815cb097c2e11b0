// thai-idcard/src/reader/link.rs

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct LinkState {
    epoch: AtomicU64,
    bound: Mutex<Option<String>>,
}

/// Shared liveness token between the reader session and the signal path.
///
/// The session remembers the epoch it was opened under and checks it around
/// every transmit. A detach bumps the epoch without taking the session lock,
/// so a read in flight fails with `DeviceLost` at its next exchange instead
/// of holding the close up.
#[derive(Debug, Clone, Default)]
pub struct Link {
    inner: Arc<LinkState>,
}

impl Link {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.inner.epoch.load(Ordering::SeqCst)
    }

    pub fn is_current(&self, epoch: u64) -> bool {
        self.current() == epoch
    }

    fn bound_slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.inner.bound.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Identifier of the device the session is bound to.
    pub fn bound(&self) -> Option<String> {
        self.bound_slot().clone()
    }

    /// Bind to `identifier` and return the epoch the new handle lives in.
    pub fn bind(&self, identifier: &str) -> u64 {
        let mut bound = self.bound_slot();
        *bound = Some(identifier.to_string());
        self.current()
    }

    /// Invalidate the current handle.
    pub fn sever(&self) {
        let mut bound = self.bound_slot();
        *bound = None;
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
    }

    /// Invalidate the current handle if it belongs to `identifier`.
    pub fn sever_if_bound(&self, identifier: &str) -> bool {
        let mut bound = self.bound_slot();
        if bound.as_deref() != Some(identifier) {
            return false;
        }
        *bound = None;
        self.inner.epoch.fetch_add(1, Ordering::SeqCst);
        true
    }

    /// Forget the binding after an orderly close. The epoch still moves so a
    /// stale handle can never pass the check again.
    pub fn unbind(&self) {
        self.sever();
    }
}
