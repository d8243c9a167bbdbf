//! InMemoryBroker - 開発・テスト用の broker
//!
//! # 学習ポイント
//! - Mutex + Notify による待機（`notified()` を先に作ってから状態を確認）
//! - oneshot で submit 側に結果を返す
//! - epoch による「接続断」のシミュレーション

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify, oneshot};

use crate::ports::{AssignedJob, Broker, BrokerError, BrokerSession};

const ENDPOINT: &str = "in-memory";

struct QueuedJob {
    handle: String,
    operation: String,
    payload: Vec<u8>,
    reply: oneshot::Sender<Vec<u8>>,
}

#[derive(Default)]
struct BrokerState {
    pending: VecDeque<QueuedJob>,
    /// Connection attempts still to be refused.
    refuse_connects: u32,
    connect_attempts: u32,
    /// Bumped on `disconnect_all`; sessions from an older epoch are dead.
    epoch: u64,
    client_ids: Vec<String>,
    registered: Vec<String>,
    next_handle: u64,
}

/// Broker living in the same process.
///
/// # 使用例
/// ```ignore
/// let broker = Arc::new(InMemoryBroker::new());
/// let reply = broker.submit("approveJob", payload).await;
/// // ... supervisor serves the job ...
/// let response = reply.await?;
/// ```
#[derive(Default)]
pub struct InMemoryBroker {
    state: Arc<Mutex<BrokerState>>,
    notify: Arc<Notify>,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a job; the receiver yields the worker's response.
    pub async fn submit(&self, operation: &str, payload: Vec<u8>) -> oneshot::Receiver<Vec<u8>> {
        let (reply, receiver) = oneshot::channel();
        {
            let mut state = self.state.lock().await;
            state.next_handle += 1;
            let handle = format!("H:in-memory:{}", state.next_handle);
            state.pending.push_back(QueuedJob {
                handle,
                operation: operation.to_string(),
                payload,
                reply,
            });
        }
        self.notify.notify_waiters();
        receiver
    }

    /// Make the next `n` connection attempts fail as unavailable.
    pub async fn refuse_next_connects(&self, n: u32) {
        self.state.lock().await.refuse_connects = n;
    }

    /// Drop every open session, as if the broker restarted.
    pub async fn disconnect_all(&self) {
        self.state.lock().await.epoch += 1;
        self.notify.notify_waiters();
    }

    pub async fn connect_attempts(&self) -> u32 {
        self.state.lock().await.connect_attempts
    }

    /// Client ids set by sessions, in order.
    pub async fn client_ids(&self) -> Vec<String> {
        self.state.lock().await.client_ids.clone()
    }

    /// Operations registered by the current session.
    pub async fn registered_operations(&self) -> Vec<String> {
        self.state.lock().await.registered.clone()
    }
}

#[async_trait]
impl Broker for InMemoryBroker {
    async fn connect(&self) -> Result<Box<dyn BrokerSession>, BrokerError> {
        let mut state = self.state.lock().await;
        state.connect_attempts += 1;
        if state.refuse_connects > 0 {
            state.refuse_connects -= 1;
            return Err(BrokerError::unavailable(
                ENDPOINT,
                io::Error::new(io::ErrorKind::ConnectionRefused, "in-memory broker refused connection"),
            ));
        }
        state.registered.clear();
        Ok(Box::new(InMemorySession {
            state: Arc::clone(&self.state),
            notify: Arc::clone(&self.notify),
            epoch: state.epoch,
            in_flight: HashMap::new(),
        }))
    }

    fn endpoint(&self) -> String {
        ENDPOINT.to_string()
    }
}

struct InMemorySession {
    state: Arc<Mutex<BrokerState>>,
    notify: Arc<Notify>,
    epoch: u64,
    in_flight: HashMap<String, oneshot::Sender<Vec<u8>>>,
}

fn dropped() -> BrokerError {
    BrokerError::unavailable(
        ENDPOINT,
        io::Error::new(io::ErrorKind::ConnectionReset, "session dropped"),
    )
}

#[async_trait]
impl BrokerSession for InMemorySession {
    async fn set_client_id(&mut self, client_id: &str) -> Result<(), BrokerError> {
        let mut state = self.state.lock().await;
        if state.epoch != self.epoch {
            return Err(dropped());
        }
        state.client_ids.push(client_id.to_string());
        Ok(())
    }

    async fn register(&mut self, operation: &str) -> Result<(), BrokerError> {
        let mut state = self.state.lock().await;
        if state.epoch != self.epoch {
            return Err(dropped());
        }
        state.registered.push(operation.to_string());
        Ok(())
    }

    async fn next_job(&mut self) -> Result<AssignedJob, BrokerError> {
        let notify = Arc::clone(&self.notify);
        loop {
            let notified = notify.notified();
            {
                let mut state = self.state.lock().await;
                if state.epoch != self.epoch {
                    return Err(dropped());
                }
                if let Some(job) = state.pending.pop_front() {
                    self.in_flight.insert(job.handle.clone(), job.reply);
                    return Ok(AssignedJob {
                        handle: job.handle,
                        operation: job.operation,
                        payload: job.payload,
                    });
                }
            }
            notified.await;
        }
    }

    async fn complete(&mut self, handle: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
        let Some(reply) = self.in_flight.remove(handle) else {
            return Err(BrokerError::Protocol(format!("unknown job handle {handle}")));
        };
        // the submitter may have stopped waiting
        let _ = reply.send(payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn submit_then_serve_roundtrip() {
        let broker = InMemoryBroker::new();
        let reply = broker.submit("op", b"in".to_vec()).await;

        let mut session = broker.connect().await.unwrap();
        let job = session.next_job().await.unwrap();
        assert_eq!(job.operation, "op");
        assert_eq!(job.payload, b"in");

        session.complete(&job.handle, b"out".to_vec()).await.unwrap();
        assert_eq!(reply.await.unwrap(), b"out");
    }

    #[tokio::test]
    async fn refused_connects_are_counted() {
        let broker = InMemoryBroker::new();
        broker.refuse_next_connects(2).await;

        assert!(broker.connect().await.err().unwrap().is_unavailable());
        assert!(broker.connect().await.err().unwrap().is_unavailable());
        assert!(broker.connect().await.is_ok());
        assert_eq!(broker.connect_attempts().await, 3);
    }

    #[tokio::test]
    async fn waiting_session_sees_disconnect() {
        let broker = Arc::new(InMemoryBroker::new());
        let mut session = broker.connect().await.unwrap();

        let waiter = tokio::spawn(async move { session.next_job().await });
        tokio::task::yield_now().await;
        broker.disconnect_all().await;

        let result = waiter.await.unwrap();
        assert!(matches!(result, Err(err) if err.is_unavailable()));
    }

    #[tokio::test]
    async fn completing_unknown_handle_is_protocol_error() {
        let broker = InMemoryBroker::new();
        let mut session = broker.connect().await.unwrap();
        let err = session.complete("H:nope", Vec::new()).await.unwrap_err();
        assert!(matches!(err, BrokerError::Protocol(_)));
    }
}
