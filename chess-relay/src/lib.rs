//! 国际象棋中继服务端
//!
//! 包含:
//! - 配置加载
//! - 连接配对（后进先出）
//! - 走法记录转发与断线通知
//!
//! 中继不依赖规则引擎，也不校验任何走法。

pub mod config;
pub mod pairing;
pub mod relay;

pub use config::RelayConfig;
pub use pairing::{ConnectionId, Enqueued, PairingTable};
pub use relay::{Outbound, RelayService, RelayState};
