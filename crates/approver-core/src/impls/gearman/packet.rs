//! Packet framing.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

const HEADER_LEN: usize = 12;

/// Largest body accepted from the wire.
pub const MAX_PACKET_SIZE: u32 = 64 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Magic {
    Request,
    Response,
}

impl Magic {
    pub fn bytes(self) -> [u8; 4] {
        match self {
            Magic::Request => *b"\0REQ",
            Magic::Response => *b"\0RES",
        }
    }
}

/// Packet types used by this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PacketType {
    CanDo,
    PreSleep,
    Noop,
    SubmitJob,
    JobCreated,
    GrabJob,
    NoJob,
    JobAssign,
    WorkStatus,
    WorkComplete,
    WorkFail,
    Error,
    SetClientId,
    WorkException,
    WorkData,
    WorkWarning,
}

impl PacketType {
    pub fn code(self) -> u32 {
        match self {
            PacketType::CanDo => 1,
            PacketType::PreSleep => 4,
            PacketType::Noop => 6,
            PacketType::SubmitJob => 7,
            PacketType::JobCreated => 8,
            PacketType::GrabJob => 9,
            PacketType::NoJob => 10,
            PacketType::JobAssign => 11,
            PacketType::WorkStatus => 12,
            PacketType::WorkComplete => 13,
            PacketType::WorkFail => 14,
            PacketType::Error => 19,
            PacketType::SetClientId => 22,
            PacketType::WorkException => 25,
            PacketType::WorkData => 28,
            PacketType::WorkWarning => 29,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        let kind = match code {
            1 => PacketType::CanDo,
            4 => PacketType::PreSleep,
            6 => PacketType::Noop,
            7 => PacketType::SubmitJob,
            8 => PacketType::JobCreated,
            9 => PacketType::GrabJob,
            10 => PacketType::NoJob,
            11 => PacketType::JobAssign,
            12 => PacketType::WorkStatus,
            13 => PacketType::WorkComplete,
            14 => PacketType::WorkFail,
            19 => PacketType::Error,
            22 => PacketType::SetClientId,
            25 => PacketType::WorkException,
            28 => PacketType::WorkData,
            29 => PacketType::WorkWarning,
            _ => return None,
        };
        Some(kind)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PacketError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("unexpected packet magic {0:?}")]
    BadMagic([u8; 4]),

    #[error("unknown packet type {0}")]
    UnknownType(u32),

    #[error("packet body of {0} bytes exceeds limit")]
    TooLarge(u32),

    #[error("{kind:?} packet needs {expected} arguments")]
    MissingArguments { kind: PacketType, expected: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub kind: PacketType,
    pub data: Vec<u8>,
}

impl Packet {
    /// Build a packet from arguments, joined with NUL.
    pub fn new(kind: PacketType, args: &[&[u8]]) -> Self {
        Self {
            kind,
            data: args.join(&0u8),
        }
    }

    /// Split the body into exactly `n` arguments; the last one keeps any
    /// embedded NULs.
    pub fn args(&self, n: usize) -> Result<Vec<&[u8]>, PacketError> {
        let args: Vec<&[u8]> = self.data.splitn(n, |b| *b == 0).collect();
        if args.len() != n {
            return Err(PacketError::MissingArguments {
                kind: self.kind,
                expected: n,
            });
        }
        Ok(args)
    }

    pub fn encode(&self, magic: Magic) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.data.len());
        out.extend_from_slice(&magic.bytes());
        out.extend_from_slice(&self.kind.code().to_be_bytes());
        out.extend_from_slice(&(self.data.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.data);
        out
    }
}

pub async fn read_packet<R: AsyncRead + Unpin>(
    reader: &mut R,
    magic: Magic,
) -> Result<Packet, PacketError> {
    let mut header = [0u8; HEADER_LEN];
    reader.read_exact(&mut header).await?;

    let mut found = [0u8; 4];
    found.copy_from_slice(&header[0..4]);
    if found != magic.bytes() {
        return Err(PacketError::BadMagic(found));
    }

    let code = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);
    let kind = PacketType::from_code(code).ok_or(PacketError::UnknownType(code))?;

    let size = u32::from_be_bytes([header[8], header[9], header[10], header[11]]);
    if size > MAX_PACKET_SIZE {
        return Err(PacketError::TooLarge(size));
    }

    let mut data = vec![0u8; size as usize];
    reader.read_exact(&mut data).await?;
    Ok(Packet { kind, data })
}

pub async fn write_packet<W: AsyncWrite + Unpin>(
    writer: &mut W,
    packet: &Packet,
    magic: Magic,
) -> Result<(), PacketError> {
    writer.write_all(&packet.encode(magic)).await?;
    writer.flush().await?;
    Ok(())
}
