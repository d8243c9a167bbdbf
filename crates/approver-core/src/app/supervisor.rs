//! ConnectionSupervisor - broker への接続と serve ループの監視
//!
//! # 状態遷移
//! Disconnected → Connected → Serving → (broker error) → Disconnected(backoff) → ...
//!
//! - 接続後: client id 設定 → 全操作を register → job を 1 件ずつ処理
//! - broker エラー: `RetryState` の遅延だけ眠ってから再接続（遅延はリセットしない）
//! - shutdown: watch channel で停止要求（job 待ち中か backoff 中のみ反応）

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::backoff::{BackoffPolicy, RetryState};
use super::dispatcher::Dispatcher;
use crate::ports::{Broker, BrokerError};

pub struct ConnectionSupervisor {
    broker: Arc<dyn Broker>,
    dispatcher: Arc<Dispatcher>,
    client_id: String,
    retry: RetryState,
}

impl ConnectionSupervisor {
    pub fn new(
        broker: Arc<dyn Broker>,
        dispatcher: Arc<Dispatcher>,
        client_id: impl Into<String>,
        backoff: BackoffPolicy,
    ) -> Self {
        Self {
            broker,
            dispatcher,
            client_id: client_id.into(),
            retry: RetryState::new(backoff),
        }
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn retry_state(&self) -> &RetryState {
        &self.retry
    }

    /// Run on a background task; stop it through the returned handle.
    pub fn spawn(mut self) -> SupervisorHandle {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let join = tokio::spawn(async move {
            self.run(&mut shutdown_rx).await;
            self
        });
        SupervisorHandle { shutdown_tx, join }
    }

    /// Connect-and-serve until shutdown is requested (or the sender is gone).
    pub async fn run(&mut self, shutdown: &mut watch::Receiver<bool>) {
        loop {
            if *shutdown.borrow() {
                break;
            }

            let error = match self.connect_and_serve(shutdown).await {
                Ok(()) => break,
                Err(error) => error,
            };

            let delay = self.retry.next_delay();
            let endpoint = self.broker.endpoint();
            if error.is_unavailable() {
                warn!(%endpoint, %error, delay_ms = delay.as_millis() as u64, "broker unavailable, reconnecting after backoff");
            } else {
                error!(%endpoint, %error, delay_ms = delay.as_millis() as u64, "broker session failed, reconnecting after backoff");
            }

            if sleep_or_shutdown(delay, shutdown).await {
                break;
            }
        }
        info!(client_id = %self.client_id, "supervisor stopped");
    }

    async fn connect_and_serve(
        &mut self,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), BrokerError> {
        let mut session = self.broker.connect().await?;
        session.set_client_id(&self.client_id).await?;
        for operation in self.dispatcher.operations() {
            session.register(&operation).await?;
        }
        info!(
            endpoint = %self.broker.endpoint(),
            client_id = %self.client_id,
            "connected to broker, serving"
        );

        loop {
            let job = tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return Ok(());
                    }
                    continue;
                }
                job = session.next_job() => job?,
            };

            debug!(handle = %job.handle, operation = %job.operation, "job assigned");
            let response = self.dispatcher.dispatch(&job.operation, job.payload).await;
            session.complete(&job.handle, response).await?;
        }
    }
}

/// Returns `true` when shutdown was requested during the sleep.
async fn sleep_or_shutdown(delay: Duration, shutdown: &mut watch::Receiver<bool>) -> bool {
    tokio::select! {
        _ = tokio::time::sleep(delay) => false,
        changed = shutdown.changed() => changed.is_err() || *shutdown.borrow(),
    }
}

/// Handle to a spawned supervisor.
pub struct SupervisorHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<ConnectionSupervisor>,
}

impl SupervisorHandle {
    /// Ask the supervisor to stop. An in-flight job still runs to completion.
    pub fn request_shutdown(&self) {
        // ignore send error: the supervisor may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    /// Stop and wait; gives the supervisor back for inspection.
    pub async fn shutdown_and_join(self) -> Option<ConnectionSupervisor> {
        self.request_shutdown();
        self.join.await.ok()
    }
}
