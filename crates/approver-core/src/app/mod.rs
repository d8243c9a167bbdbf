//! App - アプリケーション層
//!
//! ports と typed API を組み合わせて承認ワーカーを実装します。
//!
//! # 主要コンポーネント
//! - **LockGuard**: datastore ロックの有界待ち
//! - **ApprovalAdapter**: 承認待ち registry の一覧と決定
//! - **DispatcherBuilder / Dispatcher**: 操作名 → handler のルーティング
//! - **ConnectionSupervisor**: broker 接続の維持と backoff
//! - **ApprovalWorker**: 上記すべてのワイヤリング

pub mod approvals;
pub mod backoff;
pub mod builder;
pub mod dispatcher;
pub mod handlers;
pub mod lock_guard;
pub mod supervisor;
pub mod worker;

// 主要な型を再エクスポート
pub use self::approvals::ApprovalAdapter;
pub use self::backoff::{BackoffPolicy, RetryState};
pub use self::builder::{BuildError, DispatcherBuilder};
pub use self::dispatcher::Dispatcher;
pub use self::handlers::{ApproveJobHandler, JobsAwaitingApprovalHandler};
pub use self::lock_guard::{LockGuard, LockPolicy};
pub use self::supervisor::{ConnectionSupervisor, SupervisorHandle};
pub use self::worker::{approval_dispatcher, ApprovalWorker, WorkerError};
