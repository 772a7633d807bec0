//! 走法生成
//!
//! 走法按格子生成：给定棋盘、起始格子和上一步记录，返回所有合法的目标格子。
//! 合法 = 满足棋子几何 + 走完后本方王不被攻击。
//!
//! 自将检查需要生成对方的攻击走法，所以生成分两种模式：
//! `Legal` 会经过 [`CheckOracle`] 过滤，`AttackProbe` 只给出几何上的攻击格子，
//! 不再回头做过滤，递归到此为止。

use protocol::{MoveRecord, Side, Square};

use crate::board::Board;
use crate::check::CheckOracle;
use crate::piece::{Geometry, Piece, PieceKind};

/// 生成模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationMode {
    /// 完整合法走法（过滤自将）
    Legal,
    /// 只问"能攻击到哪些格子"，不过滤，不含易位
    AttackProbe,
}

/// 走法生成器
pub struct MoveGenerator;

impl MoveGenerator {
    /// 指定格子上棋子的全部合法目标格子
    pub fn legal_moves(board: &Board, from: Square, last_move: Option<&MoveRecord>) -> Vec<Square> {
        Self::generate(board, from, last_move, GenerationMode::Legal)
    }

    /// 按模式生成目标格子
    pub fn generate(
        board: &Board,
        from: Square,
        last_move: Option<&MoveRecord>,
        mode: GenerationMode,
    ) -> Vec<Square> {
        let Some(piece) = board.get(from) else {
            return Vec::new();
        };

        let candidates = Self::pseudo_legal(board, from, piece, last_move, mode);
        match mode {
            GenerationMode::AttackProbe => candidates,
            GenerationMode::Legal => CheckOracle::king_safe(board, from, candidates, last_move),
        }
    }

    /// 伪合法目标格子（只看几何，不管自将）
    pub fn pseudo_legal(
        board: &Board,
        from: Square,
        piece: Piece,
        last_move: Option<&MoveRecord>,
        mode: GenerationMode,
    ) -> Vec<Square> {
        let mut moves = Vec::with_capacity(32);

        match piece.kind.geometry() {
            Some(geometry) => Self::generate_geometry_moves(board, from, piece.owner, geometry, &mut moves),
            None => Self::generate_pawn_moves(board, from, piece.owner, last_move, &mut moves),
        }

        if piece.kind == PieceKind::King && mode == GenerationMode::Legal {
            Self::generate_castling_moves(board, from, piece, &mut moves);
        }

        moves
    }

    /// 滑行或单步棋子（车、象、后、马、王）
    fn generate_geometry_moves(
        board: &Board,
        from: Square,
        side: Side,
        geometry: Geometry,
        moves: &mut Vec<Square>,
    ) {
        for &(d_row, d_col) in geometry.directions {
            let mut current = from;
            while let Some(to) = current.offset(d_row, d_col) {
                match board.get(to) {
                    Some(target) => {
                        // 遇到棋子就停下，对方棋子可以吃
                        if target.owner != side {
                            moves.push(to);
                        }
                        break;
                    }
                    None => moves.push(to),
                }
                if !geometry.sliding {
                    break;
                }
                current = to;
            }
        }
    }

    /// 兵：前进、斜吃、初始两步、吃过路兵
    fn generate_pawn_moves(
        board: &Board,
        from: Square,
        side: Side,
        last_move: Option<&MoveRecord>,
        moves: &mut Vec<Square>,
    ) {
        let forward = side.forward();

        if let Some(one_step) = from.offset(forward, 0) {
            if board.is_empty(one_step) {
                moves.push(one_step);

                if from.row == side.pawn_rank() {
                    if let Some(two_step) = from.offset(2 * forward, 0) {
                        if board.is_empty(two_step) {
                            moves.push(two_step);
                        }
                    }
                }
            }
        }

        for d_col in [-1i8, 1] {
            if let Some(to) = from.offset(forward, d_col) {
                if matches!(board.get(to), Some(target) if target.owner != side) {
                    moves.push(to);
                }
            }
        }

        if let Some((to, _captured)) = Self::en_passant_target(board, from, last_move) {
            moves.push(to);
        }
    }

    /// 王车易位（只检查双方未动过、中间为空；不检查王经过的格子是否被攻击）
    fn generate_castling_moves(board: &Board, from: Square, king: Piece, moves: &mut Vec<Square>) {
        if !king.can_castle() {
            return;
        }

        let row = from.row;
        // (车所在列, 中间必须为空的列, 王的目标列)
        let wings: [(u8, std::ops::RangeInclusive<u8>, u8); 2] = [(0, 1..=3, 2), (7, 5..=6, 6)];

        for (rook_col, between, king_col) in wings {
            let rook_sq = Square::new_unchecked(row, rook_col);
            let rook_ready = matches!(
                board.get(rook_sq),
                Some(rook) if rook.kind == PieceKind::Rook && rook.owner == king.owner && rook.can_castle()
            );
            if !rook_ready {
                continue;
            }

            let path_clear = between
                .into_iter()
                .all(|col| board.is_empty(Square::new_unchecked(row, col)));
            if path_clear {
                moves.push(Square::new_unchecked(row, king_col));
            }
        }
    }

    /// 吃过路兵：返回 (目标格子, 被吃兵所在格子)
    ///
    /// 条件：上一步是长度为 2 的记录，走的是兵，同一列前进了两行，
    /// 停在与本兵同一行、相邻一列的位置。
    pub fn en_passant_target(
        board: &Board,
        from: Square,
        last_move: Option<&MoveRecord>,
    ) -> Option<(Square, Square)> {
        let pawn = board.get(from).filter(|p| p.kind == PieceKind::Pawn)?;

        let Some(&MoveRecord::Plain { from: start, to: end }) = last_move else {
            return None;
        };

        let victim = board.get(end)?;
        if victim.kind != PieceKind::Pawn || victim.owner == pawn.owner {
            return None;
        }

        let double_step = start.col == end.col && start.row.abs_diff(end.row) == 2;
        let beside = from.row == pawn.owner.en_passant_rank()
            && end.row == from.row
            && end.col.abs_diff(from.col) == 1;
        if !(double_step && beside) {
            return None;
        }

        let to = Square::new(
            (from.row as i8 + pawn.owner.forward()) as u8,
            end.col,
        )?;
        Some((to, end))
    }

    /// 若王的这一步是易位，返回车的 (起点, 终点)
    pub fn castling_rook(king_from: Square, king_to: Square) -> Option<(Square, Square)> {
        if king_from.row != king_to.row || king_from.col.abs_diff(king_to.col) != 2 {
            return None;
        }
        let row = king_from.row;
        if king_to.col < king_from.col {
            Some((Square::new_unchecked(row, 0), Square::new_unchecked(row, 3)))
        } else {
            Some((Square::new_unchecked(row, 7), Square::new_unchecked(row, 5)))
        }
    }

    /// 指定阵营是否还有任意合法走法；没有即判负（将死与逼和不作区分）
    pub fn has_any_legal_move(board: &Board, side: Side, last_move: Option<&MoveRecord>) -> bool {
        board
            .pieces(side)
            .into_iter()
            .any(|(from, _)| !Self::legal_moves(board, from, last_move).is_empty())
    }
}
