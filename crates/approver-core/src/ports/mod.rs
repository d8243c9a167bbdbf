//! Ports - 外部システムへの抽象化レイヤー
//!
//! ワーカーが依存する外部リソースはすべて trait 越しに扱います。
//! - **AdvisoryLock**: datastore 層が持つプロセス共有ロック
//! - **Broker / BrokerSession**: work-queue broker（本番は Gearman）

pub mod broker;
pub mod lock;

pub use self::broker::{AssignedJob, Broker, BrokerError, BrokerSession};
pub use self::lock::AdvisoryLock;
