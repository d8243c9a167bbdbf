//! Gearman - broker プロトコル実装（TCP, バイナリ）
//!
//! # パケット形式
//! `magic(4) | type(u32 BE) | size(u32 BE) | data(size)`
//! - magic: 送信は `\0REQ`、受信は `\0RES`
//! - data: 引数を NUL 区切りで連結（最後の引数はバイナリ可）
//!
//! # 構成
//! - `packet`: フレーミングとエンコード
//! - `connection`: TCP 上の送受信とエラー分類
//! - `worker`: `Broker` / `BrokerSession` 実装
//! - `client`: SUBMIT_JOB で結果を待つクライアント

mod client;
mod connection;
mod packet;
mod worker;

pub use self::client::GearmanClient;
pub use self::packet::{Magic, Packet, PacketError, PacketType};
pub use self::worker::GearmanBroker;

/// Default job server port.
pub const DEFAULT_PORT: u16 = 4730;
