//! TCP connection to a job server, with error classification.

use tokio::net::TcpStream;
use tracing::trace;

use super::packet::{Magic, Packet, PacketError, PacketType, read_packet, write_packet};
use crate::ports::BrokerError;

pub(crate) struct Connection {
    stream: TcpStream,
    endpoint: String,
}

impl Connection {
    pub(crate) async fn open(endpoint: &str) -> Result<Self, BrokerError> {
        let stream = TcpStream::connect(endpoint)
            .await
            .map_err(|source| BrokerError::unavailable(endpoint, source))?;
        // small request/response packets; don't wait on Nagle
        stream
            .set_nodelay(true)
            .map_err(|source| BrokerError::unavailable(endpoint, source))?;
        Ok(Self {
            stream,
            endpoint: endpoint.to_string(),
        })
    }

    pub(crate) fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub(crate) async fn send(&mut self, kind: PacketType, args: &[&[u8]]) -> Result<(), BrokerError> {
        trace!(endpoint = %self.endpoint, ?kind, "send");
        let packet = Packet::new(kind, args);
        write_packet(&mut self.stream, &packet, Magic::Request)
            .await
            .map_err(|e| self.classify(e))
    }

    pub(crate) async fn recv(&mut self) -> Result<Packet, BrokerError> {
        let packet = read_packet(&mut self.stream, Magic::Response)
            .await
            .map_err(|e| self.classify(e))?;
        trace!(endpoint = %self.endpoint, kind = ?packet.kind, size = packet.data.len(), "recv");
        Ok(packet)
    }

    /// I/O failures mean the server is gone; anything else is a protocol
    /// violation.
    pub(crate) fn classify(&self, error: PacketError) -> BrokerError {
        match error {
            PacketError::Io(source) => BrokerError::unavailable(self.endpoint.as_str(), source),
            other => BrokerError::Protocol(other.to_string()),
        }
    }
}

/// Text of an `ERROR` packet (`code\0message`).
pub(crate) fn server_error(packet: &Packet) -> BrokerError {
    let text = match packet.args(2) {
        Ok(args) => format!(
            "server error {}: {}",
            String::from_utf8_lossy(args[0]),
            String::from_utf8_lossy(args[1])
        ),
        Err(_) => format!("server error {}", String::from_utf8_lossy(&packet.data)),
    };
    BrokerError::Protocol(text)
}
