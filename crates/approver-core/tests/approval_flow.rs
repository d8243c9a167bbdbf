//! End-to-end: a workflow engine registers decisions, a client drives the
//! worker through the in-memory broker.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use serde_json::json;
use tokio::sync::mpsc;

use approver_core::app::{LockGuard, LockPolicy, approval_dispatcher};
use approver_core::config::WorkerConfig;
use approver_core::domain::ApprovalAck;
use approver_core::impls::{ChainOption, ChoiceMade, ChoicePoint, InMemoryBroker, SharedLock};
use approver_core::ports::AdvisoryLock;
use approver_core::typed::codec::decode_listing_reply;
use approver_core::{ApprovalRegistry, ApprovalWorker, SupervisorHandle};

struct Harness {
    broker: Arc<InMemoryBroker>,
    registry: ApprovalRegistry,
    lock: Arc<SharedLock>,
    choices: mpsc::UnboundedReceiver<ChoiceMade>,
    engine: mpsc::UnboundedSender<ChoiceMade>,
    handle: SupervisorHandle,
}

impl Harness {
    fn start() -> Self {
        let broker = Arc::new(InMemoryBroker::new());
        let registry = ApprovalRegistry::new();
        let lock = Arc::new(SharedLock::new());
        let (engine, choices) = mpsc::unbounded_channel();

        let mut config = WorkerConfig::default();
        config.identity.hostname = Some("mcp-test".to_string());
        let worker = ApprovalWorker::new(config, registry.clone(), lock.clone());
        let handle = worker.supervisor(broker.clone()).unwrap().spawn();

        Self {
            broker,
            registry,
            lock,
            choices,
            engine,
            handle,
        }
    }

    fn register(&self, job_uuid: &str, chains: &[&str]) {
        let chains = chains
            .iter()
            .map(|id| ChainOption::new(*id, format!("chain {id}")))
            .collect();
        let created_at = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let point = ChoicePoint::new(job_uuid, "unit", "unit-1", chains, self.engine.clone())
            .with_created_at(created_at);
        self.registry.insert(Arc::new(point));
    }

    async fn call(&self, operation: &str, payload: Vec<u8>) -> Vec<u8> {
        self.broker.submit(operation, payload).await.await.unwrap()
    }

    async fn approve(&self, job: &str, chain: &str, uid: serde_json::Value) -> ApprovalAck {
        let payload = serde_json::to_vec(&json!({"jobUUID": job, "chain": chain, "uid": uid})).unwrap();
        let reply = self.call("approveJob", payload).await;
        serde_json::from_slice(&reply).unwrap()
    }

    async fn list(&self) -> String {
        let reply = self.call("getJobsAwaitingApproval", Vec::new()).await;
        decode_listing_reply(&reply).unwrap().unwrap()
    }
}

#[tokio::test]
async fn approving_a_listed_job_runs_its_continuation() {
    let mut h = Harness::start();
    h.register("job-1", &["A", "B"]);

    let listing = h.list().await;
    assert!(listing.starts_with("<choicesAvailableForUnits>\n"));
    assert!(listing.contains("<UUID>job-1</UUID>"));
    assert!(listing.contains("<chainAvailable>B</chainAvailable>"));
    assert!(listing.contains("<createdAt>2024-05-01T12:00:00Z</createdAt>"));

    let ack = h.approve("job-1", "A", json!(42)).await;
    assert_eq!(ack, ApprovalAck::new("job-1", "A"));

    let choice = h.choices.recv().await.unwrap();
    assert_eq!(
        choice,
        ChoiceMade {
            job_uuid: "job-1".to_string(),
            chain: "A".to_string(),
            agent: "42".to_string(),
        }
    );
    assert!(!h.lock.is_held());

    // engine applies the choice and drops the entry
    h.registry.remove("job-1");
    assert_eq!(h.list().await, "<choicesAvailableForUnits/>\n");

    assert_eq!(h.broker.client_ids().await, vec!["mcp-test_MCPServer".to_string()]);
    h.handle.shutdown_and_join().await.unwrap();
}

#[tokio::test]
async fn unknown_job_is_acknowledged_without_side_effects() {
    let mut h = Harness::start();
    h.register("job-1", &["A"]);

    let ack = h.approve("job-2", "A", json!("alice")).await;
    assert_eq!(ack.message, "approving: ");
    assert_eq!(ack.job_uuid, "job-2");
    assert_eq!(ack.chain, "A");

    assert!(h.choices.try_recv().is_err());
    assert!(h.registry.contains("job-1"));
    h.handle.shutdown_and_join().await.unwrap();
}

#[tokio::test]
async fn malformed_request_gets_empty_reply_and_worker_keeps_serving() {
    let h = Harness::start();

    let reply = h.call("approveJob", b"{not json".to_vec()).await;
    assert!(reply.is_empty());

    let listing = h.list().await;
    assert_eq!(listing, "<choicesAvailableForUnits/>\n");
    h.handle.shutdown_and_join().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn listing_reports_lock_timeout_as_error_document() {
    let h = Harness::start();
    h.register("job-1", &["A"]);

    assert!(h.lock.try_acquire());
    let holder = h.lock.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        holder.release();
    });

    let reply = h.call("getJobsAwaitingApproval", Vec::new()).await;
    let document = String::from_utf8(reply).unwrap();
    assert_eq!(
        document,
        "<Error>\n  <code>DatabaseLock</code>\n  <details>Couldn't acquire database lock</details>\n</Error>\n"
    );

    // once the holder lets go the listing works again
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(h.list().await.contains("<UUID>job-1</UUID>"));
    h.handle.shutdown_and_join().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn listing_waits_out_a_short_lock_hold() {
    let registry = ApprovalRegistry::new();
    let lock = Arc::new(SharedLock::new());
    let guard = LockGuard::new(lock.clone(), LockPolicy::default());
    let dispatcher = approval_dispatcher(registry, guard).unwrap();

    assert!(lock.try_acquire());
    let holder = lock.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(250)).await;
        holder.release();
    });

    let reply = dispatcher.dispatch("getJobsAwaitingApproval", Vec::new()).await;
    assert_eq!(
        decode_listing_reply(&reply).unwrap().as_deref(),
        Some("<choicesAvailableForUnits/>\n")
    );
    assert!(!lock.is_held());
}
