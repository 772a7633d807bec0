//! 棋盘显示模块

mod render;

pub use render::*;
