//! Domain model (documents, decisions, registry, errors).
//!
//! ワーカーが扱うデータの「形」だけを定義します。
//! broker や datastore への依存はここには持ち込みません。

pub mod decision;
pub mod document;
pub mod errors;
pub mod registry;

pub use decision::{ApprovalAck, ApproveJobRequest, DecisionRequest, PendingDecision};
pub use document::Element;
pub use errors::{ErrorCode, RpcError, StructuredError};
pub use registry::ApprovalRegistry;
