//! 错误类型定义

use thiserror::Error;

/// 协议错误类型
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// IO 错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// 序列化错误（bincode）
    #[error("Bincode serialization error: {0}")]
    Bincode(#[from] bincode::Error),

    /// 协议版本不匹配
    #[error("Protocol version mismatch: expected {expected}, got {actual}")]
    VersionMismatch { expected: u8, actual: u8 },

    /// 帧大小超限
    #[error("Frame too large: {size} bytes (max: {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// 连接超时
    #[error("Connection timeout")]
    ConnectionTimeout,

    /// 连接已关闭
    #[error("Connection closed")]
    ConnectionClosed,

    /// 握手字节无法识别
    #[error("Malformed handshake byte: {byte}")]
    MalformedHandshake { byte: u8 },

    /// 走法记录长度不在 1..=4 之内
    #[error("Invalid move record length: {len}")]
    InvalidRecordLength { len: usize },

    /// 坐标越界
    #[error("Invalid square: ({row}, {col})")]
    InvalidSquare { row: u8, col: u8 },
}

/// 协议操作结果类型
pub type Result<T> = std::result::Result<T, ProtocolError>;
