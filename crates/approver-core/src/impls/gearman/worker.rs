//! Worker side: `Broker` / `BrokerSession` over the Gearman protocol.
//!
//! # フロー
//! 1. SET_CLIENT_ID, CAN_DO × n
//! 2. GRAB_JOB → NO_JOB なら PRE_SLEEP して NOOP を待ち、再度 GRAB_JOB
//! 3. JOB_ASSIGN を受け取ったら handler 実行 → WORK_COMPLETE

use async_trait::async_trait;
use tracing::debug;

use super::connection::{Connection, server_error};
use super::packet::PacketType;
use crate::ports::{AssignedJob, Broker, BrokerError, BrokerSession};

/// Connects worker sessions to one job server.
#[derive(Debug, Clone)]
pub struct GearmanBroker {
    endpoint: String,
}

impl GearmanBroker {
    /// `endpoint` is `host:port`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl Broker for GearmanBroker {
    async fn connect(&self) -> Result<Box<dyn BrokerSession>, BrokerError> {
        let connection = Connection::open(&self.endpoint).await?;
        Ok(Box::new(GearmanSession { connection }))
    }

    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }
}

struct GearmanSession {
    connection: Connection,
}

impl GearmanSession {
    /// After PRE_SLEEP the server wakes us with NOOP once work may exist.
    async fn sleep_until_woken(&mut self) -> Result<(), BrokerError> {
        self.connection.send(PacketType::PreSleep, &[]).await?;
        loop {
            let packet = self.connection.recv().await?;
            match packet.kind {
                PacketType::Noop => return Ok(()),
                PacketType::Error => return Err(server_error(&packet)),
                other => debug!(endpoint = %self.connection.endpoint(), kind = ?other, "ignoring packet while asleep"),
            }
        }
    }
}

#[async_trait]
impl BrokerSession for GearmanSession {
    async fn set_client_id(&mut self, client_id: &str) -> Result<(), BrokerError> {
        self.connection
            .send(PacketType::SetClientId, &[client_id.as_bytes()])
            .await
    }

    async fn register(&mut self, operation: &str) -> Result<(), BrokerError> {
        self.connection
            .send(PacketType::CanDo, &[operation.as_bytes()])
            .await
    }

    async fn next_job(&mut self) -> Result<AssignedJob, BrokerError> {
        loop {
            self.connection.send(PacketType::GrabJob, &[]).await?;
            loop {
                let packet = self.connection.recv().await?;
                match packet.kind {
                    PacketType::JobAssign => {
                        let args = packet.args(3).map_err(|e| self.connection.classify(e))?;
                        return Ok(AssignedJob {
                            handle: String::from_utf8_lossy(args[0]).into_owned(),
                            operation: String::from_utf8_lossy(args[1]).into_owned(),
                            payload: args[2].to_vec(),
                        });
                    }
                    PacketType::NoJob => {
                        self.sleep_until_woken().await?;
                        break;
                    }
                    // a late wake-up from an earlier PRE_SLEEP
                    PacketType::Noop => continue,
                    PacketType::Error => return Err(server_error(&packet)),
                    other => {
                        return Err(BrokerError::Protocol(format!(
                            "unexpected {other:?} in reply to GRAB_JOB"
                        )));
                    }
                }
            }
        }
    }

    async fn complete(&mut self, handle: &str, payload: Vec<u8>) -> Result<(), BrokerError> {
        self.connection
            .send(PacketType::WorkComplete, &[handle.as_bytes(), payload.as_slice()])
            .await
    }
}
