//! SharedLock - in-process advisory lock.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::ports::AdvisoryLock;

/// A non-reentrant flag lock shared (via `Arc`) between the datastore layer
/// and the worker.
#[derive(Debug, Default)]
pub struct SharedLock {
    held: AtomicBool,
}

impl SharedLock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::Acquire)
    }
}

impl AdvisoryLock for SharedLock {
    fn try_acquire(&self) -> bool {
        self.held
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn release(&self) {
        self.held.store(false, Ordering::Release);
    }
}
