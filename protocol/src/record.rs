//! 走法记录（线上格式）
//!
//! 线上是一个 1~4 个格子的序列，长度决定含义：
//! - 1：终局信号
//! - 2：普通走法 `[from, to]`
//! - 3：吃过路兵 `[from, to, captured]`
//! - 4：王车易位 `[king_from, king_to, rook_from, rook_to]`

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::square::Square;

/// "我认输/被将死" 的终局格子，接收方据此判定自己获胜
pub const RESIGN_SQUARE: Square = Square::new_unchecked(0, 0);

/// 中继服务端注入的对手断线格子
pub const DISCONNECT_SQUARE: Square = Square::new_unchecked(1, 1);

/// 走法记录
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<Square>", try_from = "Vec<Square>")]
pub enum MoveRecord {
    /// 终局信号
    Terminal(Square),
    /// 普通走法
    Plain { from: Square, to: Square },
    /// 吃过路兵
    EnPassant {
        from: Square,
        to: Square,
        captured: Square,
    },
    /// 王车易位
    Castle {
        king_from: Square,
        king_to: Square,
        rook_from: Square,
        rook_to: Square,
    },
}

impl MoveRecord {
    /// 认输/被将死信号 `[(0,0)]`
    pub fn resign() -> Self {
        MoveRecord::Terminal(RESIGN_SQUARE)
    }

    /// 对手断线信号 `[(1,1)]`
    pub fn disconnect_notice() -> Self {
        MoveRecord::Terminal(DISCONNECT_SQUARE)
    }

    /// 是否是终局信号
    pub fn is_terminal(&self) -> bool {
        matches!(self, MoveRecord::Terminal(_))
    }

    /// 是否表示发送方认输（接收方获胜）
    pub fn is_resignation(&self) -> bool {
        matches!(self, MoveRecord::Terminal(sq) if *sq == RESIGN_SQUARE)
    }

    /// 线上序列长度
    pub fn len(&self) -> usize {
        match self {
            MoveRecord::Terminal(_) => 1,
            MoveRecord::Plain { .. } => 2,
            MoveRecord::EnPassant { .. } => 3,
            MoveRecord::Castle { .. } => 4,
        }
    }

    /// 记录永远非空
    pub fn is_empty(&self) -> bool {
        false
    }

    /// 起止格子（终局信号没有）
    pub fn from_to(&self) -> Option<(Square, Square)> {
        match *self {
            MoveRecord::Terminal(_) => None,
            MoveRecord::Plain { from, to } | MoveRecord::EnPassant { from, to, .. } => Some((from, to)),
            MoveRecord::Castle {
                king_from, king_to, ..
            } => Some((king_from, king_to)),
        }
    }

    /// 展开为格子序列
    pub fn squares(&self) -> Vec<Square> {
        match *self {
            MoveRecord::Terminal(sq) => vec![sq],
            MoveRecord::Plain { from, to } => vec![from, to],
            MoveRecord::EnPassant { from, to, captured } => vec![from, to, captured],
            MoveRecord::Castle {
                king_from,
                king_to,
                rook_from,
                rook_to,
            } => vec![king_from, king_to, rook_from, rook_to],
        }
    }
}

impl From<MoveRecord> for Vec<Square> {
    fn from(record: MoveRecord) -> Self {
        record.squares()
    }
}

impl TryFrom<Vec<Square>> for MoveRecord {
    type Error = ProtocolError;

    fn try_from(squares: Vec<Square>) -> Result<Self, Self::Error> {
        if let Some(bad) = squares.iter().find(|sq| !sq.is_valid()) {
            return Err(ProtocolError::InvalidSquare {
                row: bad.row,
                col: bad.col,
            });
        }

        match squares.as_slice() {
            [sq] => Ok(MoveRecord::Terminal(*sq)),
            [from, to] => Ok(MoveRecord::Plain { from: *from, to: *to }),
            [from, to, captured] => Ok(MoveRecord::EnPassant {
                from: *from,
                to: *to,
                captured: *captured,
            }),
            [king_from, king_to, rook_from, rook_to] => Ok(MoveRecord::Castle {
                king_from: *king_from,
                king_to: *king_to,
                rook_from: *rook_from,
                rook_to: *rook_to,
            }),
            _ => Err(ProtocolError::InvalidRecordLength { len: squares.len() }),
        }
    }
}

impl std::fmt::Display for MoveRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let squares = self.squares();
        for (i, sq) in squares.iter().enumerate() {
            if i > 0 {
                write!(f, " -> ")?;
            }
            write!(f, "{}", sq)?;
        }
        Ok(())
    }
}
