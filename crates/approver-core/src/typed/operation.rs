//! Operation trait - 操作名とリクエスト型の対応付け

use serde::de::DeserializeOwned;

use super::codec::{CodecError, decode_from_transport};
use crate::domain::ApproveJobRequest;

/// A named remote operation.
///
/// # 使用例
/// ```ignore
/// struct Ping;
///
/// impl Operation for Ping {
///     const NAME: &'static str = "ping";
///     type Request = ();
/// }
/// ```
pub trait Operation: Send + Sync + 'static {
    /// Name the operation is registered under at the broker.
    const NAME: &'static str;

    /// Decoded request record.
    type Request: DeserializeOwned + Send + 'static;

    /// Decode the raw payload. Transport form by default.
    fn decode(payload: &[u8]) -> Result<Self::Request, CodecError> {
        decode_from_transport(payload)
    }
}

/// `approveJob`: resolve one pending decision.
pub struct ApproveJob;

impl Operation for ApproveJob {
    const NAME: &'static str = "approveJob";
    type Request = ApproveJobRequest;
}

/// `getJobsAwaitingApproval`: list pending decisions.
pub struct GetJobsAwaitingApproval;

impl Operation for GetJobsAwaitingApproval {
    const NAME: &'static str = "getJobsAwaitingApproval";
    type Request = ();

    // Callers send anything (usually nothing); the payload is not read.
    fn decode(_payload: &[u8]) -> Result<(), CodecError> {
        Ok(())
    }
}
