//! ApprovalAdapter - レジストリへの読み取り・単一キー操作
//!
//! 判断ロジック自体は各 `PendingDecision` に委譲します。
//! ここで行う副作用は continuation の呼び出しだけです。

use std::sync::Arc;

use tracing::debug;

use crate::domain::{ApprovalAck, ApprovalRegistry, DecisionRequest, PendingDecision};

/// Worker-side view of the engine's registry.
#[derive(Debug, Clone)]
pub struct ApprovalAdapter {
    registry: ApprovalRegistry,
}

impl ApprovalAdapter {
    pub fn new(registry: ApprovalRegistry) -> Self {
        Self { registry }
    }

    /// Snapshot of pending decisions in registry order.
    ///
    /// The engine may change the registry right after; callers must tolerate
    /// a stale list.
    pub fn list_pending(&self) -> Vec<Arc<dyn PendingDecision>> {
        self.registry.snapshot()
    }

    /// Hand the choice to the decision registered under `request.job_uuid`.
    ///
    /// Unknown ids are a silent no-op; the acknowledgement is the same either
    /// way.
    pub fn resolve(&self, request: &DecisionRequest) -> ApprovalAck {
        debug!(
            job_uuid = %request.job_uuid,
            chain = %request.chain,
            agent = %request.agent,
            "approving"
        );
        // The registry lock is released before the continuation runs.
        match self.registry.get(&request.job_uuid) {
            Some(decision) => decision.proceed_with_choice(&request.chain, &request.agent),
            None => debug!(job_uuid = %request.job_uuid, "no pending decision for job"),
        }
        ApprovalAck::new(request.job_uuid.clone(), request.chain.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Element;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recording {
        id: String,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl Recording {
        fn new(id: &str) -> Self {
            Self {
                id: id.to_string(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl PendingDecision for Recording {
        fn job_uuid(&self) -> &str {
            &self.id
        }
        fn chains(&self) -> Vec<String> {
            vec!["A".to_string(), "B".to_string()]
        }
        fn to_element(&self) -> Element {
            Element::text_node("decision", self.id.as_str())
        }
        fn proceed_with_choice(&self, chain: &str, agent: &str) {
            self.calls
                .lock()
                .unwrap()
                .push((chain.to_string(), agent.to_string()));
        }
    }

    fn request(job: &str, chain: &str, agent: &str) -> DecisionRequest {
        DecisionRequest {
            job_uuid: job.to_string(),
            chain: chain.to_string(),
            agent: agent.to_string(),
        }
    }

    #[test]
    fn known_job_invokes_continuation() {
        let registry = ApprovalRegistry::new();
        let decision = Arc::new(Recording::new("job-1"));
        registry.insert(decision.clone());
        let adapter = ApprovalAdapter::new(registry);

        let ack = adapter.resolve(&request("job-1", "A", "42"));

        assert_eq!(ack, ApprovalAck::new("job-1", "A"));
        assert_eq!(
            *decision.calls.lock().unwrap(),
            vec![("A".to_string(), "42".to_string())]
        );
    }

    #[test]
    fn unknown_job_is_a_no_op() {
        let registry = ApprovalRegistry::new();
        let decision = Arc::new(Recording::new("job-1"));
        registry.insert(decision.clone());
        let adapter = ApprovalAdapter::new(registry.clone());

        let ack = adapter.resolve(&request("job-2", "A", "42"));

        assert_eq!(ack.job_uuid, "job-2");
        assert_eq!(ack.chain, "A");
        assert!(decision.calls.lock().unwrap().is_empty());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn continuation_may_remove_its_own_entry() {
        struct SelfRemoving {
            registry: ApprovalRegistry,
        }
        impl PendingDecision for SelfRemoving {
            fn job_uuid(&self) -> &str {
                "job-1"
            }
            fn chains(&self) -> Vec<String> {
                Vec::new()
            }
            fn to_element(&self) -> Element {
                Element::new("x")
            }
            fn proceed_with_choice(&self, _chain: &str, _agent: &str) {
                self.registry.remove("job-1");
            }
        }

        let registry = ApprovalRegistry::new();
        registry.insert(Arc::new(SelfRemoving {
            registry: registry.clone(),
        }));
        let adapter = ApprovalAdapter::new(registry.clone());

        adapter.resolve(&request("job-1", "A", "1"));
        assert!(registry.is_empty());
    }

    #[test]
    fn list_pending_is_idempotent_when_unchanged() {
        let registry = ApprovalRegistry::new();
        registry.insert(Arc::new(Recording::new("a")));
        registry.insert(Arc::new(Recording::new("b")));
        let adapter = ApprovalAdapter::new(registry);

        let first: Vec<String> = adapter.list_pending().iter().map(|d| d.job_uuid().to_string()).collect();
        let second: Vec<String> = adapter.list_pending().iter().map(|d| d.job_uuid().to_string()).collect();
        assert_eq!(first, vec!["a", "b"]);
        assert_eq!(first, second);
    }
}
