//! 国际象棋规则引擎
//!
//! 包含：
//! - 棋子与棋盘
//! - 走法生成（含吃过路兵、王车易位、升变）
//! - 将军判定
//! - 对局状态（本地走子与对手记录的应用）

pub mod board;
pub mod check;
pub mod error;
pub mod game;
pub mod moves;
pub mod piece;

pub use board::Board;
pub use check::CheckOracle;
pub use error::{ChessError, Result};
pub use game::GameState;
pub use moves::{GenerationMode, MoveGenerator};
pub use piece::{Geometry, Piece, PieceKind};
