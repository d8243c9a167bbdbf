//! Client side: submit a job and wait for its result.

use tracing::debug;
use ulid::Ulid;

use super::connection::{Connection, server_error};
use super::packet::PacketType;
use crate::ports::BrokerError;

/// Foreground job submission against one job server.
pub struct GearmanClient {
    connection: Connection,
}

impl GearmanClient {
    pub async fn connect(endpoint: &str) -> Result<Self, BrokerError> {
        Ok(Self {
            connection: Connection::open(endpoint).await?,
        })
    }

    /// Submit `payload` to `operation` and wait for WORK_COMPLETE.
    pub async fn submit(&mut self, operation: &str, payload: &[u8]) -> Result<Vec<u8>, BrokerError> {
        let unique = Ulid::new().to_string();
        self.connection
            .send(
                PacketType::SubmitJob,
                &[operation.as_bytes(), unique.as_bytes(), payload],
            )
            .await?;

        let handle = loop {
            let packet = self.connection.recv().await?;
            match packet.kind {
                PacketType::JobCreated => break packet.data,
                PacketType::Error => return Err(server_error(&packet)),
                other => debug!(kind = ?other, "ignoring packet before JOB_CREATED"),
            }
        };
        let handle_text = String::from_utf8_lossy(&handle).into_owned();
        debug!(handle = %handle_text, operation, "job created");

        loop {
            let packet = self.connection.recv().await?;
            match packet.kind {
                PacketType::WorkComplete => {
                    let args = packet.args(2).map_err(|e| self.connection.classify(e))?;
                    if args[0] == handle.as_slice() {
                        return Ok(args[1].to_vec());
                    }
                }
                PacketType::WorkFail => {
                    return Err(BrokerError::JobFailed {
                        handle: handle_text,
                        reason: "worker reported failure".to_string(),
                    });
                }
                PacketType::WorkException => {
                    let reason = match packet.args(2) {
                        Ok(args) => String::from_utf8_lossy(args[1]).into_owned(),
                        Err(_) => "worker raised an exception".to_string(),
                    };
                    return Err(BrokerError::JobFailed {
                        handle: handle_text,
                        reason,
                    });
                }
                PacketType::WorkStatus | PacketType::WorkData | PacketType::WorkWarning | PacketType::Noop => {}
                PacketType::Error => return Err(server_error(&packet)),
                other => {
                    return Err(BrokerError::Protocol(format!(
                        "unexpected {other:?} while waiting for job {handle_text}"
                    )));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;

    use crate::impls::gearman::packet::{Magic, Packet, read_packet, write_packet};
    use tokio::net::{TcpListener, TcpStream};

    async fn reply(stream: &mut TcpStream, kind: PacketType, args: &[&[u8]]) {
        write_packet(stream, &Packet::new(kind, args), Magic::Response)
            .await
            .unwrap();
    }

    async fn serve_one<F, Fut>(script: F) -> String
    where
        F: FnOnce(TcpStream) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let endpoint = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            script(stream).await;
        });
        endpoint
    }

    #[tokio::test]
    async fn submit_returns_work_complete_payload() {
        let endpoint = serve_one(|mut stream| async move {
            let submit = read_packet(&mut stream, Magic::Request).await.unwrap();
            assert_eq!(submit.kind, PacketType::SubmitJob);
            let args = submit.args(3).unwrap();
            assert_eq!(args[0], b"getJobsAwaitingApproval");
            assert_eq!(args[2], b"");

            reply(&mut stream, PacketType::JobCreated, &[b"H:srv:7"]).await;
            reply(&mut stream, PacketType::WorkStatus, &[b"H:srv:7", b"1", b"2"]).await;
            reply(&mut stream, PacketType::WorkComplete, &[b"H:srv:7", b"done"]).await;
        })
        .await;

        let mut client = GearmanClient::connect(&endpoint).await.unwrap();
        let out = client.submit("getJobsAwaitingApproval", b"").await.unwrap();
        assert_eq!(out, b"done");
    }

    #[tokio::test]
    async fn work_fail_is_job_failed() {
        let endpoint = serve_one(|mut stream| async move {
            read_packet(&mut stream, Magic::Request).await.unwrap();
            reply(&mut stream, PacketType::JobCreated, &[b"H:srv:8"]).await;
            reply(&mut stream, PacketType::WorkFail, &[b"H:srv:8"]).await;
        })
        .await;

        let mut client = GearmanClient::connect(&endpoint).await.unwrap();
        let err = client.submit("approveJob", b"{}").await.unwrap_err();
        assert!(matches!(err, BrokerError::JobFailed { handle, .. } if handle == "H:srv:8"));
    }

    #[tokio::test]
    async fn work_exception_carries_the_reason() {
        let endpoint = serve_one(|mut stream| async move {
            read_packet(&mut stream, Magic::Request).await.unwrap();
            reply(&mut stream, PacketType::JobCreated, &[b"H:srv:9"]).await;
            reply(&mut stream, PacketType::WorkData, &[b"H:srv:9", b"partial"]).await;
            reply(&mut stream, PacketType::WorkException, &[b"H:srv:9", b"decision blew up"]).await;
        })
        .await;

        let mut client = GearmanClient::connect(&endpoint).await.unwrap();
        let err = client.submit("approveJob", b"{}").await.unwrap_err();
        assert!(matches!(
            err,
            BrokerError::JobFailed { handle, reason } if handle == "H:srv:9" && reason == "decision blew up"
        ));
    }

    #[tokio::test]
    async fn server_error_before_job_created_is_protocol_error() {
        let endpoint = serve_one(|mut stream| async move {
            read_packet(&mut stream, Magic::Request).await.unwrap();
            reply(&mut stream, PacketType::Error, &[b"ERR_QUEUE", b"queue full"]).await;
        })
        .await;

        let mut client = GearmanClient::connect(&endpoint).await.unwrap();
        let err = client.submit("getJobsAwaitingApproval", b"").await.unwrap_err();
        assert!(matches!(&err, BrokerError::Protocol(text) if text.contains("queue full")), "{err}");
    }
}
