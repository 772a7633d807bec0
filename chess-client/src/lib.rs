//! 国际象棋终端客户端
//!
//! 通过中继与另一名玩家对弈，规则由本地的 `chess-rules` 执行。

pub mod board;
pub mod game;
pub mod network;
pub mod settings;
