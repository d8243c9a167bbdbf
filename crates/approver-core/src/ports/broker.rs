//! Broker port - named-task work-queue の抽象化
//!
//! # フロー
//! 1. `Broker::connect()` でセッション確立
//! 2. `set_client_id()` / `register()` で自身を登録
//! 3. `next_job()` → dispatch → `complete()` を繰り返す
//!
//! 接続断は `BrokerError::Unavailable` として返し、supervisor が backoff 後に
//! 再接続します。

use async_trait::async_trait;

/// A job handed to this worker by the broker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignedJob {
    /// Broker-side job handle, echoed back on completion.
    pub handle: String,
    /// Registered operation name the job was submitted for.
    pub operation: String,
    pub payload: Vec<u8>,
}

#[derive(Debug, thiserror::Error)]
pub enum BrokerError {
    /// Connection refused, reset or closed by the broker.
    #[error("broker unavailable at {endpoint}: {source}")]
    Unavailable {
        endpoint: String,
        #[source]
        source: std::io::Error,
    },

    /// The broker sent something this client does not understand.
    #[error("broker protocol violation: {0}")]
    Protocol(String),

    /// A submitted job was reported failed by the worker side.
    #[error("job {handle} failed: {reason}")]
    JobFailed { handle: String, reason: String },
}

impl BrokerError {
    pub fn unavailable(endpoint: impl Into<String>, source: std::io::Error) -> Self {
        BrokerError::Unavailable {
            endpoint: endpoint.into(),
            source,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, BrokerError::Unavailable { .. })
    }
}

/// Factory for broker sessions; one call per (re)connect.
#[async_trait]
pub trait Broker: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn BrokerSession>, BrokerError>;

    /// Human-readable endpoint, for logs.
    fn endpoint(&self) -> String;
}

/// One live connection to the broker, worker side.
#[async_trait]
pub trait BrokerSession: Send {
    async fn set_client_id(&mut self, client_id: &str) -> Result<(), BrokerError>;

    /// Announce that this worker can run `operation`.
    async fn register(&mut self, operation: &str) -> Result<(), BrokerError>;

    /// Wait until the broker assigns a job.
    async fn next_job(&mut self) -> Result<AssignedJob, BrokerError>;

    /// Report the result of a job previously returned by `next_job`.
    async fn complete(&mut self, handle: &str, payload: Vec<u8>) -> Result<(), BrokerError>;
}
