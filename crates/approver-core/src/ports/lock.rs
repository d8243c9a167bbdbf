//! AdvisoryLock port - datastore ロックの抽象化

/// The datastore's process-wide lock, as seen by the worker.
///
/// Only a non-blocking acquire and a release are needed: the worker uses the
/// lock to detect contention, never to hold a critical section.
pub trait AdvisoryLock: Send + Sync {
    /// Try to take the lock without waiting. Returns `true` on success.
    fn try_acquire(&self) -> bool;

    /// Release a lock previously taken with `try_acquire`.
    fn release(&self);
}
