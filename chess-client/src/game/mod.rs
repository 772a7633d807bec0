//! 游戏逻辑模块
//!
//! 管理对局会话和交互

mod input;
mod session;
mod state;

pub use input::*;
pub use session::*;
pub use state::*;
