//! The two RPC handlers.
//!
//! Encoding is chosen per path:
//! - `approveJob`: transport form of the acknowledgement
//! - `getJobsAwaitingApproval`: document text wrapped in transport form,
//!   except a lock timeout, which is returned as bare document text

use async_trait::async_trait;
use tracing::debug;

use super::approvals::ApprovalAdapter;
use super::lock_guard::LockGuard;
use crate::domain::{ApproveJobRequest, RpcError};
use crate::typed::codec::{build_approval_list, build_error, encode_document, encode_for_transport};
use crate::typed::{ApproveJob, GetJobsAwaitingApproval, Handler};

pub struct ApproveJobHandler {
    approvals: ApprovalAdapter,
}

impl ApproveJobHandler {
    pub fn new(approvals: ApprovalAdapter) -> Self {
        Self { approvals }
    }
}

#[async_trait]
impl Handler<ApproveJob> for ApproveJobHandler {
    async fn handle(&self, request: ApproveJobRequest) -> Result<Vec<u8>, RpcError> {
        let decision = request.into_decision();
        let ack = self.approvals.resolve(&decision);
        Ok(encode_for_transport(&ack)?)
    }
}

pub struct JobsAwaitingApprovalHandler {
    approvals: ApprovalAdapter,
    guard: LockGuard,
}

impl JobsAwaitingApprovalHandler {
    pub fn new(approvals: ApprovalAdapter, guard: LockGuard) -> Self {
        Self { approvals, guard }
    }
}

#[async_trait]
impl Handler<GetJobsAwaitingApproval> for JobsAwaitingApprovalHandler {
    async fn handle(&self, _request: ()) -> Result<Vec<u8>, RpcError> {
        if let Some(error) = self.guard.check().await {
            let document = encode_document(&build_error(&error))?;
            return Ok(document.into_bytes());
        }

        let pending = self.approvals.list_pending();
        debug!(count = pending.len(), "listing jobs awaiting approval");
        let document = encode_document(&build_approval_list(&pending))?;
        Ok(encode_for_transport(&document)?)
    }
}
