//! 国际象棋对战共享协议库
//!
//! 包含:
//! - 坐标、阵营等线上数据结构
//! - 走法记录（按长度区分含义的格子序列）
//! - 握手消息与对局结果码
//! - 传输层（帧编解码、TCP 连接、RecordSource/RecordSink traits）
//!
//! 规则引擎在 `chess-rules` 中，中继服务端只依赖本库。

mod constants;
mod error;
mod message;
mod record;
mod square;
mod transport;

pub use constants::*;
pub use error::{ProtocolError, Result};
pub use message::{Admission, GameResult, MatchFound};
pub use record::{MoveRecord, DISCONNECT_SQUARE, RESIGN_SQUARE};
pub use square::{Side, Square};
pub use transport::{
    encode_payload, FrameReader, FrameWriter, NetworkConfig, RecordSink, RecordSource,
    TcpConnection, TcpConnector, TcpListener,
};
