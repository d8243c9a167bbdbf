//! approver-core
//!
//! Building blocks for the approval RPC worker: a process that registers with a
//! work-queue broker and answers `approveJob` / `getJobsAwaitingApproval` on
//! behalf of the jobs paused at a decision point.
//!
//! # モジュール構成
//! - **domain**: ドキュメント・承認待ち decision・registry・エラー
//! - **ports**: 抽象化レイヤー（AdvisoryLock, Broker, BrokerSession）
//! - **typed**: 型付き Operation API（Operation trait, Handler trait, codec）
//! - **app**: lock guard, handler, dispatcher, supervisor
//! - **impls**: Gearman / in-memory broker, SharedLock, ChoicePoint
//! - **config**: TOML + 環境変数による設定

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod ports;
pub mod typed;

pub use app::{approval_dispatcher, ApprovalWorker, SupervisorHandle, WorkerError};
pub use config::{ConfigError, WorkerConfig};
pub use domain::{ApprovalRegistry, PendingDecision};
