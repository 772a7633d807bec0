//! 规则层错误类型

use protocol::{MoveRecord, Square};
use thiserror::Error;

/// 规则错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChessError {
    #[error("Not your turn")]
    NotYourTurn,

    #[error("No piece at {square}")]
    NoPiece { square: Square },

    #[error("Piece at {square} is not yours")]
    NotYourPiece { square: Square },

    #[error("No piece selected")]
    NothingSelected,

    #[error("Invalid move: {from} -> {to}")]
    InvalidMove { from: Square, to: Square },

    #[error("Game is already over")]
    GameOver,

    #[error("Illegal remote move {record}: {reason}")]
    IllegalRemoteMove {
        record: MoveRecord,
        reason: &'static str,
    },
}

pub type Result<T> = std::result::Result<T, ChessError>;
