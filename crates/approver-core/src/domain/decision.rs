//! Decision model: pending human approvals and the records that travel over
//! the wire when one is resolved.

use serde::{Deserialize, Serialize};

use super::document::Element;

/// A workflow branch point waiting for a human to pick a chain.
///
/// Implemented by the workflow engine. The worker only reads the record and
/// calls `proceed_with_choice`; applying the choice (and removing the entry
/// from the registry) is the engine's job.
pub trait PendingDecision: Send + Sync {
    /// Unique job identifier this decision is registered under.
    fn job_uuid(&self) -> &str;

    /// Identifiers of the chains that can be chosen.
    fn chains(&self) -> Vec<String>;

    /// Structured record of the decision, used as one child of the listing.
    fn to_element(&self) -> Element;

    /// Continuation: apply `chain` on behalf of `agent`.
    fn proceed_with_choice(&self, chain: &str, agent: &str);
}

/// Wire record of an `approveJob` request.
///
/// `uid` is whatever scalar the client sent; it is normalised to a string by
/// [`ApproveJobRequest::into_decision`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproveJobRequest {
    #[serde(rename = "jobUUID")]
    pub job_uuid: String,
    pub chain: String,
    pub uid: serde_json::Value,
}

impl ApproveJobRequest {
    pub fn new(job_uuid: impl Into<String>, chain: impl Into<String>, uid: impl Into<serde_json::Value>) -> Self {
        Self {
            job_uuid: job_uuid.into(),
            chain: chain.into(),
            uid: uid.into(),
        }
    }

    pub fn into_decision(self) -> DecisionRequest {
        let agent = match self.uid {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };
        DecisionRequest {
            job_uuid: self.job_uuid,
            chain: self.chain,
            agent,
        }
    }
}

/// A decoded request to resolve one pending decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionRequest {
    pub job_uuid: String,
    pub chain: String,
    pub agent: String,
}

/// Acknowledgement returned by `approveJob`.
///
/// Identical whether or not the job was known: an unknown id is a silent
/// no-op.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalAck {
    pub message: String,
    #[serde(rename = "jobUUID")]
    pub job_uuid: String,
    pub chain: String,
}

impl ApprovalAck {
    pub const MESSAGE: &'static str = "approving: ";

    pub fn new(job_uuid: impl Into<String>, chain: impl Into<String>) -> Self {
        Self {
            message: Self::MESSAGE.to_string(),
            job_uuid: job_uuid.into(),
            chain: chain.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case(json!("42"), "42")]
    #[case(json!(42), "42")]
    #[case(json!(true), "true")]
    #[case(json!(null), "null")]
    fn uid_is_normalised_to_string(#[case] uid: serde_json::Value, #[case] expected: &str) {
        let request = ApproveJobRequest::new("job-1", "A", uid);
        let decision = request.into_decision();
        assert_eq!(decision.agent, expected);
        assert_eq!(decision.job_uuid, "job-1");
        assert_eq!(decision.chain, "A");
    }

    #[test]
    fn request_uses_wire_key_names() {
        let v: ApproveJobRequest =
            serde_json::from_value(json!({"jobUUID": "j", "chain": "c", "uid": 7})).unwrap();
        assert_eq!(v.job_uuid, "j");
        assert_eq!(v.uid, json!(7));
    }

    #[test]
    fn ack_serializes_with_wire_key_names() {
        let v = serde_json::to_value(ApprovalAck::new("job-2", "A")).unwrap();
        assert_eq!(v, json!({"message": "approving: ", "jobUUID": "job-2", "chain": "A"}));
    }
}
