//! 协议常量定义

use std::time::Duration;

/// 协议版本号
pub const PROTOCOL_VERSION: u8 = 1;

/// 棋盘边长（行数 = 列数）
pub const BOARD_SIZE: usize = 8;

/// 消息帧最大大小（与原接收缓冲区一致）
pub const MAX_FRAME_SIZE: usize = 4096;

/// 中继服务端最大同时连接数
pub const MAX_CONNECTIONS: usize = 20;

/// 默认端口
pub const DEFAULT_PORT: u16 = 9593;

/// 接收走法时的单次等待（秒）
pub const RECEIVE_WAIT_SECS: u64 = 1;

/// 无数据时的空闲间隔（秒）
pub const POLL_IDLE_SECS: u64 = 1;

/// 连接超时（秒）
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// 接收等待 Duration
pub const RECEIVE_WAIT: Duration = Duration::from_secs(RECEIVE_WAIT_SECS);

/// 空闲间隔 Duration
pub const POLL_IDLE: Duration = Duration::from_secs(POLL_IDLE_SECS);

/// 连接超时 Duration
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(CONNECT_TIMEOUT_SECS);
