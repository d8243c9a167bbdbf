//! ApprovalRegistry - 保留中の判断（job_uuid → PendingDecision）の共有マップ
//!
//! # 所有関係
//! - workflow engine が insert / remove する（正本）
//! - ワーカーは clone したハンドルで読み取りと continuation 呼び出しのみ
//!
//! # ロック方針
//! - 内部は `RwLock<IndexMap<..>>`（挿入順を保持）
//! - decision を呼び出す間はロックを保持しない
//!   （continuation が自分自身を remove してもデッドロックしない）

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use indexmap::IndexMap;

use super::decision::PendingDecision;

type Entries = IndexMap<String, Arc<dyn PendingDecision>>;

/// Shared mapping of pending decisions. Cloning yields another handle to the
/// same live set.
#[derive(Clone, Default)]
pub struct ApprovalRegistry {
    entries: Arc<RwLock<Entries>>,
}

impl ApprovalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a decision under its job id, replacing any previous entry.
    pub fn insert(&self, decision: Arc<dyn PendingDecision>) -> Option<Arc<dyn PendingDecision>> {
        let key = decision.job_uuid().to_string();
        self.write().insert(key, decision)
    }

    pub fn remove(&self, job_uuid: &str) -> Option<Arc<dyn PendingDecision>> {
        self.write().shift_remove(job_uuid)
    }

    pub fn get(&self, job_uuid: &str) -> Option<Arc<dyn PendingDecision>> {
        self.read().get(job_uuid).cloned()
    }

    pub fn contains(&self, job_uuid: &str) -> bool {
        self.read().contains_key(job_uuid)
    }

    /// Point-in-time copy of the entries in insertion order.
    pub fn snapshot(&self) -> Vec<Arc<dyn PendingDecision>> {
        self.read().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A panicking engine thread poisons the lock but leaves the map intact.
    fn read(&self) -> RwLockReadGuard<'_, Entries> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Entries> {
        self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for ApprovalRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApprovalRegistry")
            .field("job_uuids", &self.read().keys().collect::<Vec<_>>())
            .finish()
    }
}
