//! Typed - 型付き Operation API
//!
//! 操作名の typo を型で排除し、Handler との対応付けを静的に保証します。
//!
//! # 二層構造
//! - **表層（Typed）**: `Operation` trait, `Handler<O>` trait - 型安全
//! - **内部（Dyn）**: `DynHandler` trait - bytes → bytes, object-safe

pub mod codec;
pub mod handler;
pub mod operation;
pub mod registry;

pub use self::codec::CodecError;
pub use self::handler::{DynHandler, Handler, TypedHandler};
pub use self::operation::{ApproveJob, GetJobsAwaitingApproval, Operation};
pub use self::registry::{OperationRegistry, RegistryError};
