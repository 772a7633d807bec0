//! 将军判定
//!
//! 所有判定都在棋盘副本上模拟，调用方的棋盘在任何路径上都不会被修改。

use protocol::{MoveRecord, Side, Square};

use crate::board::Board;
use crate::moves::{GenerationMode, MoveGenerator};
use crate::piece::PieceKind;

/// 将军判定器
pub struct CheckOracle;

impl CheckOracle {
    /// 把 `square` 上的棋子拿掉后，其所属阵营的王是否被攻击
    ///
    /// 如果该格子上就是王，则王保留在原处。空格子返回 false。
    pub fn is_attacked(board: &Board, square: Square, last_move: Option<&MoveRecord>) -> bool {
        let Some(piece) = board.get(square) else {
            return false;
        };

        if piece.kind == PieceKind::King {
            return Self::king_in_check(board, piece.owner, last_move);
        }

        let mut probe = board.clone();
        probe.set(square, None);
        Self::king_in_check(&probe, piece.owner, last_move)
    }

    /// 指定阵营的王是否被将军
    pub fn king_in_check(board: &Board, side: Side, last_move: Option<&MoveRecord>) -> bool {
        match board.find_king(side) {
            Some(king) => Self::square_attacked_by(board, king, side.opponent(), last_move),
            None => false,
        }
    }

    /// `attacker` 阵营是否有棋子能走到 `target`
    pub fn square_attacked_by(
        board: &Board,
        target: Square,
        attacker: Side,
        last_move: Option<&MoveRecord>,
    ) -> bool {
        board.pieces(attacker).into_iter().any(|(from, piece)| {
            MoveGenerator::pseudo_legal(board, from, piece, last_move, GenerationMode::AttackProbe)
                .contains(&target)
        })
    }

    /// 过滤候选目标，只保留走完后本方王安全的
    pub fn king_safe(
        board: &Board,
        from: Square,
        candidates: Vec<Square>,
        last_move: Option<&MoveRecord>,
    ) -> Vec<Square> {
        let Some(piece) = board.get(from) else {
            return Vec::new();
        };
        let en_passant = MoveGenerator::en_passant_target(board, from, last_move);

        candidates
            .into_iter()
            .filter(|&to| {
                let mut probe = board.clone();
                // 吃过路兵时被吃的兵不在目标格子上，需要单独移除
                if let Some((ep_to, captured)) = en_passant {
                    if ep_to == to {
                        probe.set(captured, None);
                    }
                }
                probe.move_piece(from, to);
                !Self::king_in_check(&probe, piece.owner, last_move)
            })
            .collect()
    }
}
