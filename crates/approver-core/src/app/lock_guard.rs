//! LockGuard - datastore ロックの空き確認（bounded retry）
//!
//! # 振る舞い
//! 1. `try_acquire()` を試す
//! 2. 失敗したら `poll_interval` 眠って再試行（待ち時間を積算）
//! 3. 積算が `max_wait` を超えたら `DatabaseLock` エラー
//! 4. 取れたら即 `release()`（確認するだけで保持はしない）
//!
//! ロックを保持したままレジストリを読むわけではないので、
//! これは advisory なチェックです。

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::domain::StructuredError;
use crate::ports::AdvisoryLock;

/// Polling policy for the lock check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockPolicy {
    pub poll_interval: Duration,
    pub max_wait: Duration,
}

impl Default for LockPolicy {
    /// 100ms polls, give up after 4s.
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            max_wait: Duration::from_secs(4),
        }
    }
}

#[derive(Clone)]
pub struct LockGuard {
    lock: Arc<dyn AdvisoryLock>,
    policy: LockPolicy,
}

impl LockGuard {
    pub fn new(lock: Arc<dyn AdvisoryLock>, policy: LockPolicy) -> Self {
        Self { lock, policy }
    }

    /// Returns `None` when the lock was free at some poll within the budget.
    ///
    /// Waited time is counted in poll intervals, so a budget of 4s with 100ms
    /// polls gives up after the 41st failed attempt.
    pub async fn check(&self) -> Option<StructuredError> {
        // A zero interval would spin without ever growing the wait.
        let step = self.policy.poll_interval.max(Duration::from_millis(1));
        let mut waited = Duration::ZERO;
        let mut attempts: u32 = 0;

        while !self.lock.try_acquire() {
            attempts += 1;
            tokio::time::sleep(step).await;
            waited += step;
            if waited > self.policy.max_wait {
                warn!(
                    attempts,
                    waited_ms = waited.as_millis() as u64,
                    "datastore lock still held, giving up"
                );
                return Some(StructuredError::database_lock());
            }
        }
        self.lock.release();

        if attempts > 0 {
            debug!(attempts, waited_ms = waited.as_millis() as u64, "datastore lock became free");
        }
        None
    }
}
