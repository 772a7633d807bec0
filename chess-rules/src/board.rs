//! 棋盘状态

use protocol::{Side, Square, BOARD_SIZE};

use crate::piece::{Piece, PieceKind};

/// 底线从第 0 列到第 7 列的棋子顺序
const BACK_RANK: [PieceKind; BOARD_SIZE] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

/// 棋盘
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    /// 8x8 棋盘，索引为 row * 8 + col
    squares: [Option<Piece>; BOARD_SIZE * BOARD_SIZE],
}

impl Board {
    /// 创建空棋盘
    pub fn empty() -> Self {
        Self {
            squares: [None; BOARD_SIZE * BOARD_SIZE],
        }
    }

    /// 创建初始棋盘
    pub fn initial() -> Self {
        let mut board = Self::empty();

        for side in [Side::A, Side::B] {
            for (col, kind) in BACK_RANK.iter().enumerate() {
                let col = col as u8;
                board.set(
                    Square::new_unchecked(side.back_rank(), col),
                    Some(Piece::new(*kind, side)),
                );
                board.set(
                    Square::new_unchecked(side.pawn_rank(), col),
                    Some(Piece::new(PieceKind::Pawn, side)),
                );
            }
        }

        board
    }

    /// 获取指定格子的棋子
    pub fn get(&self, sq: Square) -> Option<Piece> {
        if sq.is_valid() {
            self.squares[sq.to_index()]
        } else {
            None
        }
    }

    /// 设置指定格子的棋子
    pub fn set(&mut self, sq: Square, piece: Option<Piece>) {
        if sq.is_valid() {
            self.squares[sq.to_index()] = piece;
        }
    }

    /// 格子是否为空
    pub fn is_empty(&self, sq: Square) -> bool {
        self.get(sq).is_none()
    }

    /// 移动棋子（不检查规则），返回被吃的棋子
    pub fn move_piece(&mut self, from: Square, to: Square) -> Option<Piece> {
        let piece = self.get(from);
        let captured = self.get(to);
        self.set(from, None);
        self.set(to, piece);
        captured
    }

    /// 查找指定阵营的王
    pub fn find_king(&self, side: Side) -> Option<Square> {
        Square::all().find(|&sq| {
            matches!(self.get(sq), Some(piece) if piece.kind == PieceKind::King && piece.owner == side)
        })
    }

    /// 获取指定阵营的所有棋子
    pub fn pieces(&self, side: Side) -> Vec<(Square, Piece)> {
        Square::all()
            .filter_map(|sq| self.get(sq).map(|piece| (sq, piece)))
            .filter(|(_, piece)| piece.owner == side)
            .collect()
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::initial()
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "  ")?;
        for col in 0..BOARD_SIZE {
            write!(f, " {}", col)?;
        }
        writeln!(f)?;
        for row in 0..BOARD_SIZE {
            write!(f, "{} ", row)?;
            for col in 0..BOARD_SIZE {
                let sq = Square::new_unchecked(row as u8, col as u8);
                let c = self.get(sq).map(|p| p.to_char()).unwrap_or('.');
                write!(f, " {}", c)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
