//! Impls - ports の実装
//!
//! # 含まれる実装
//! - **GearmanBroker / GearmanClient**: 本番用の Gearman プロトコル実装
//! - **InMemoryBroker**: 開発・テスト用の broker
//! - **SharedLock**: プロセス内の advisory lock
//! - **ChoicePoint**: workflow engine が登録できる参照実装の PendingDecision

pub mod choice_point;
pub mod gearman;
pub mod inmem_broker;
pub mod shared_lock;

pub use self::choice_point::{ChainOption, ChoiceMade, ChoicePoint};
pub use self::gearman::{GearmanBroker, GearmanClient};
pub use self::inmem_broker::InMemoryBroker;
pub use self::shared_lock::SharedLock;
