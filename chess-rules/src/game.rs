//! 对局状态
//!
//! 每个对等端各自持有一份 [`GameState`]，本地走子和对手发来的记录
//! 走同一套落子规则，所以双方的棋盘始终一致。
//! 需要发给对手的记录通过返回值（outbox）交给调用方，状态本身不做 I/O。

use protocol::{GameResult, MoveRecord, Side, Square};
use tracing::{debug, info, warn};

use crate::board::Board;
use crate::error::{ChessError, Result};
use crate::moves::MoveGenerator;
use crate::piece::{Piece, PieceKind};

/// 一局棋的本地状态
#[derive(Debug, Clone)]
pub struct GameState {
    board: Board,
    /// 本方阵营
    me: Side,
    /// 当前走子方
    turn: Side,
    /// 最近一步（本地或对手）
    last_move: Option<MoveRecord>,
    /// 已选中、等待落子的格子
    selected: Option<Square>,
    result: GameResult,
}

impl GameState {
    /// 标准开局，A 方先走
    pub fn new(me: Side) -> Self {
        Self::with_board(Board::initial(), me, Side::A)
    }

    /// 从指定局面开始
    pub fn with_board(board: Board, me: Side, turn: Side) -> Self {
        Self {
            board,
            me,
            turn,
            last_move: None,
            selected: None,
            result: GameResult::InProgress,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn me(&self) -> Side {
        self.me
    }

    pub fn turn(&self) -> Side {
        self.turn
    }

    pub fn last_move(&self) -> Option<&MoveRecord> {
        self.last_move.as_ref()
    }

    pub fn selected(&self) -> Option<Square> {
        self.selected
    }

    pub fn result(&self) -> GameResult {
        self.result
    }

    /// 是否轮到本方且对局未结束
    pub fn is_my_turn(&self) -> bool {
        self.turn == self.me && !self.result.is_over()
    }

    /// 选中本方棋子，返回其合法目标格子
    pub fn select_piece(&mut self, square: Square) -> Result<Vec<Square>> {
        self.ensure_in_progress()?;
        if self.turn != self.me {
            return Err(ChessError::NotYourTurn);
        }

        let piece = self.board.get(square).ok_or(ChessError::NoPiece { square })?;
        if piece.owner != self.me {
            return Err(ChessError::NotYourPiece { square });
        }

        self.selected = Some(square);
        Ok(self.legal_targets())
    }

    /// 当前选中棋子的合法目标格子（用于高亮）
    pub fn legal_targets(&self) -> Vec<Square> {
        match self.selected {
            Some(from) => MoveGenerator::legal_moves(&self.board, from, self.last_move.as_ref()),
            None => Vec::new(),
        }
    }

    /// 把选中的棋子落到 `dest`
    ///
    /// 无论成功与否都会清除选中状态。成功时返回需要发给对手的记录；
    /// 如果对手因此无子可走，本方直接判胜。
    pub fn attempt_move(&mut self, dest: Square) -> Result<Vec<MoveRecord>> {
        let from = self.selected.take().ok_or(ChessError::NothingSelected)?;
        self.ensure_in_progress()?;
        if self.turn != self.me {
            return Err(ChessError::NotYourTurn);
        }

        let targets = MoveGenerator::legal_moves(&self.board, from, self.last_move.as_ref());
        if !targets.contains(&dest) {
            return Err(ChessError::InvalidMove { from, to: dest });
        }

        let record = self.build_record(from, dest);
        self.apply_record(record);
        debug!("Local move {}", record);

        if !MoveGenerator::has_any_legal_move(&self.board, self.turn, self.last_move.as_ref()) {
            self.result = GameResult::Won;
            info!("Opponent has no legal move, game won");
        }

        Ok(vec![record])
    }

    /// 应用对手发来的记录，返回需要回发的记录
    ///
    /// 终局信号直接结束对局；走法记录应用后若本方无子可走，
    /// 判负并回发一次 `[(0,0)]`。对局结束后收到的任何记录都被忽略。
    pub fn apply_remote(&mut self, record: &MoveRecord) -> Result<Vec<MoveRecord>> {
        if self.result.is_over() {
            debug!("Ignoring record {} after game end", record);
            return Ok(Vec::new());
        }

        if record.is_terminal() {
            self.result = if record.is_resignation() {
                GameResult::Won
            } else {
                GameResult::OpponentDisconnected
            };
            self.selected = None;
            info!("Received terminal record {}, result: {}", record, self.result);
            return Ok(Vec::new());
        }

        self.validate_remote(record)?;
        self.apply_record(*record);
        debug!("Remote move {}", record);

        let mut outbox = Vec::new();
        if !MoveGenerator::has_any_legal_move(&self.board, self.me, self.last_move.as_ref()) {
            self.result = GameResult::Lost;
            self.selected = None;
            info!("No legal move left, game lost");
            outbox.push(MoveRecord::resign());
        }
        Ok(outbox)
    }

    /// 本方认输
    pub fn resign(&mut self) -> Result<Vec<MoveRecord>> {
        self.ensure_in_progress()?;
        self.result = GameResult::Lost;
        self.selected = None;
        info!("Resigned");
        Ok(vec![MoveRecord::resign()])
    }

    /// 连接中断（读写失败或协议违规）
    pub fn connection_lost(&mut self) {
        if !self.result.is_over() {
            warn!("Connection lost while game in progress");
            self.result = GameResult::OpponentDisconnected;
            self.selected = None;
        }
    }

    fn ensure_in_progress(&self) -> Result<()> {
        if self.result.is_over() {
            Err(ChessError::GameOver)
        } else {
            Ok(())
        }
    }

    /// 根据起止格子构造记录（普通 / 吃过路兵 / 易位）
    fn build_record(&self, from: Square, to: Square) -> MoveRecord {
        let kind = self.board.get(from).map(|p| p.kind);

        if kind == Some(PieceKind::King) {
            if let Some((rook_from, rook_to)) = MoveGenerator::castling_rook(from, to) {
                return MoveRecord::Castle {
                    king_from: from,
                    king_to: to,
                    rook_from,
                    rook_to,
                };
            }
        }

        if kind == Some(PieceKind::Pawn) {
            if let Some((ep_to, captured)) =
                MoveGenerator::en_passant_target(&self.board, from, self.last_move.as_ref())
            {
                if ep_to == to {
                    return MoveRecord::EnPassant { from, to, captured };
                }
            }
        }

        MoveRecord::Plain { from, to }
    }

    /// 执行一条已确认的走法记录：移动棋子、换手、记录最近一步
    fn apply_record(&mut self, record: MoveRecord) {
        match record {
            MoveRecord::Terminal(_) => return,
            MoveRecord::Plain { from, to } => self.relocate(from, to),
            MoveRecord::EnPassant { from, to, captured } => {
                self.board.set(captured, None);
                self.relocate(from, to);
            }
            MoveRecord::Castle {
                king_from,
                king_to,
                rook_from,
                rook_to,
            } => {
                self.relocate(king_from, king_to);
                self.relocate(rook_from, rook_to);
            }
        }

        self.last_move = Some(record);
        self.turn = self.turn.opponent();
    }

    /// 移动单个棋子，处理移动标记和升变
    fn relocate(&mut self, from: Square, to: Square) {
        let Some(mut piece) = self.board.get(from) else {
            return;
        };

        piece.mark_moved();
        if piece.kind == PieceKind::Pawn && to.row == piece.owner.promotion_rank() {
            piece = Piece::new(PieceKind::Queen, piece.owner);
        }

        self.board.set(from, None);
        self.board.set(to, Some(piece));
    }

    /// 对手记录的基本检查：轮次正确，且动的是对手自己的棋子
    fn validate_remote(&self, record: &MoveRecord) -> Result<()> {
        let opponent = self.me.opponent();

        if self.turn != opponent {
            return Err(ChessError::IllegalRemoteMove {
                record: *record,
                reason: "not the opponent's turn",
            });
        }

        let owned = record
            .from_to()
            .and_then(|(from, _)| self.board.get(from))
            .is_some_and(|piece| piece.owner == opponent);
        if !owned {
            return Err(ChessError::IllegalRemoteMove {
                record: *record,
                reason: "origin square holds no opponent piece",
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(row: u8, col: u8) -> Square {
        Square::new_unchecked(row, col)
    }

    /// 一方走子，另一方接收，返回接收方回发的记录
    fn play(mover: &mut GameState, receiver: &mut GameState, from: Square, to: Square) -> Vec<MoveRecord> {
        mover.select_piece(from).unwrap();
        let outbox = mover.attempt_move(to).unwrap();
        assert_eq!(outbox.len(), 1);

        let mut replies = Vec::new();
        for record in &outbox {
            replies.extend(receiver.apply_remote(record).unwrap());
        }
        replies
    }

    fn pair() -> (GameState, GameState) {
        (GameState::new(Side::A), GameState::new(Side::B))
    }

    #[test]
    fn test_new_game() {
        let game = GameState::new(Side::A);
        assert_eq!(game.turn(), Side::A);
        assert!(game.is_my_turn());
        assert!(game.last_move().is_none());
        assert_eq!(game.result(), GameResult::InProgress);

        let game = GameState::new(Side::B);
        assert!(!game.is_my_turn());
    }

    #[test]
    fn test_select_rules() {
        let (mut a, mut b) = pair();

        assert_eq!(b.select_piece(sq(1, 0)), Err(ChessError::NotYourTurn));
        assert_eq!(
            a.select_piece(sq(1, 0)),
            Err(ChessError::NotYourPiece { square: sq(1, 0) })
        );
        assert_eq!(
            a.select_piece(sq(4, 4)),
            Err(ChessError::NoPiece { square: sq(4, 4) })
        );

        let targets = a.select_piece(sq(6, 4)).unwrap();
        assert_eq!(targets, vec![sq(5, 4), sq(4, 4)]);
        assert_eq!(a.selected(), Some(sq(6, 4)));
        assert_eq!(a.legal_targets(), targets);
    }

    #[test]
    fn test_attempt_move_clears_selection() {
        let mut a = GameState::new(Side::A);

        assert_eq!(a.attempt_move(sq(5, 4)), Err(ChessError::NothingSelected));

        a.select_piece(sq(6, 4)).unwrap();
        assert_eq!(
            a.attempt_move(sq(3, 4)),
            Err(ChessError::InvalidMove {
                from: sq(6, 4),
                to: sq(3, 4)
            })
        );
        assert!(a.selected().is_none());
        assert_eq!(a.turn(), Side::A);

        a.select_piece(sq(6, 4)).unwrap();
        let outbox = a.attempt_move(sq(4, 4)).unwrap();
        assert_eq!(outbox, vec![MoveRecord::Plain { from: sq(6, 4), to: sq(4, 4) }]);
        assert!(a.selected().is_none());
        assert_eq!(a.turn(), Side::B);
        assert_eq!(a.last_move(), Some(&outbox[0]));
        assert!(!a.is_my_turn());
    }

    #[test]
    fn test_fools_mate() {
        let (mut a, mut b) = pair();

        assert!(play(&mut a, &mut b, sq(6, 5), sq(5, 5)).is_empty());
        assert!(play(&mut b, &mut a, sq(1, 4), sq(3, 4)).is_empty());
        assert!(play(&mut a, &mut b, sq(6, 6), sq(4, 6)).is_empty());

        // B 的后将死 A
        let replies = play(&mut b, &mut a, sq(0, 3), sq(4, 7));
        assert_eq!(b.result(), GameResult::Won);
        assert_eq!(a.result(), GameResult::Lost);
        assert_eq!(replies, vec![MoveRecord::resign()]);
        assert!(!MoveGenerator::has_any_legal_move(a.board(), Side::A, a.last_move()));

        // B 收到 [(0,0)] 时已经结束，忽略
        assert!(b.apply_remote(&replies[0]).unwrap().is_empty());
        assert_eq!(b.result(), GameResult::Won);

        // A 不会再次发送
        let again = MoveRecord::Plain { from: sq(1, 0), to: sq(2, 0) };
        assert!(a.apply_remote(&again).unwrap().is_empty());
        assert_eq!(a.result(), GameResult::Lost);
        assert_eq!(a.resign(), Err(ChessError::GameOver));
    }

    #[test]
    fn test_en_passant_record_replayed() {
        let (mut a, mut b) = pair();

        play(&mut a, &mut b, sq(6, 4), sq(4, 4));
        play(&mut b, &mut a, sq(1, 0), sq(2, 0));
        play(&mut a, &mut b, sq(4, 4), sq(3, 4));
        play(&mut b, &mut a, sq(1, 3), sq(3, 3));

        let targets = a.select_piece(sq(3, 4)).unwrap();
        assert!(targets.contains(&sq(2, 3)));
        let outbox = a.attempt_move(sq(2, 3)).unwrap();
        assert_eq!(
            outbox,
            vec![MoveRecord::EnPassant {
                from: sq(3, 4),
                to: sq(2, 3),
                captured: sq(3, 3)
            }]
        );
        b.apply_remote(&outbox[0]).unwrap();

        assert!(a.board().is_empty(sq(3, 3)));
        assert_eq!(a.board(), b.board());
    }

    #[test]
    fn test_en_passant_expires() {
        let (mut a, mut b) = pair();

        play(&mut a, &mut b, sq(6, 4), sq(4, 4));
        play(&mut b, &mut a, sq(1, 0), sq(2, 0));
        play(&mut a, &mut b, sq(4, 4), sq(3, 4));
        play(&mut b, &mut a, sq(1, 3), sq(3, 3));
        play(&mut a, &mut b, sq(6, 0), sq(5, 0));
        play(&mut b, &mut a, sq(2, 0), sq(3, 0));

        let targets = a.select_piece(sq(3, 4)).unwrap();
        assert_eq!(targets, vec![sq(2, 4)]);
    }

    #[test]
    fn test_castling_record_replayed() {
        let mut board = Board::empty();
        board.set(sq(7, 4), Some(Piece::new(PieceKind::King, Side::A)));
        board.set(sq(7, 7), Some(Piece::new(PieceKind::Rook, Side::A)));
        board.set(sq(0, 4), Some(Piece::new(PieceKind::King, Side::B)));
        board.set(sq(1, 0), Some(Piece::new(PieceKind::Pawn, Side::B)));

        let mut a = GameState::with_board(board.clone(), Side::A, Side::A);
        let mut b = GameState::with_board(board, Side::B, Side::A);

        a.select_piece(sq(7, 4)).unwrap();
        let outbox = a.attempt_move(sq(7, 6)).unwrap();
        assert_eq!(
            outbox,
            vec![MoveRecord::Castle {
                king_from: sq(7, 4),
                king_to: sq(7, 6),
                rook_from: sq(7, 7),
                rook_to: sq(7, 5)
            }]
        );
        assert!(b.apply_remote(&outbox[0]).unwrap().is_empty());

        assert_eq!(a.board(), b.board());
        let king = b.board().get(sq(7, 6)).unwrap();
        let rook = b.board().get(sq(7, 5)).unwrap();
        assert_eq!(king.kind, PieceKind::King);
        assert_eq!(rook.kind, PieceKind::Rook);
        assert!(king.ever_moved && rook.ever_moved);
        assert_eq!(b.turn(), Side::B);
    }

    #[test]
    fn test_promotion_to_queen() {
        let mut board = Board::empty();
        board.set(sq(7, 4), Some(Piece::new(PieceKind::King, Side::A)));
        board.set(sq(1, 0), Some(Piece::new(PieceKind::Pawn, Side::A)));
        board.set(sq(4, 7), Some(Piece::new(PieceKind::King, Side::B)));

        let mut a = GameState::with_board(board.clone(), Side::A, Side::A);
        let mut b = GameState::with_board(board, Side::B, Side::A);

        play(&mut a, &mut b, sq(1, 0), sq(0, 0));

        let queen = Piece::new(PieceKind::Queen, Side::A);
        assert_eq!(a.board().get(sq(0, 0)), Some(queen));
        assert_eq!(b.board().get(sq(0, 0)), Some(queen));
    }

    #[test]
    fn test_remote_move_validation() {
        let (mut a, mut b) = pair();

        // 还没轮到对手
        let early = MoveRecord::Plain { from: sq(1, 0), to: sq(2, 0) };
        assert!(matches!(
            a.apply_remote(&early),
            Err(ChessError::IllegalRemoteMove { .. })
        ));

        // 对手动了不属于自己的棋子
        let wrong_piece = MoveRecord::Plain { from: sq(1, 0), to: sq(2, 0) };
        assert!(matches!(
            b.apply_remote(&wrong_piece),
            Err(ChessError::IllegalRemoteMove { .. })
        ));
        let empty_origin = MoveRecord::Plain { from: sq(4, 4), to: sq(3, 4) };
        assert!(matches!(
            b.apply_remote(&empty_origin),
            Err(ChessError::IllegalRemoteMove { .. })
        ));

        // 状态未被修改
        assert_eq!(b.board(), &Board::initial());
        assert_eq!(b.turn(), Side::A);
    }

    #[test]
    fn test_terminal_records() {
        let mut b = GameState::new(Side::B);
        assert!(b.apply_remote(&MoveRecord::resign()).unwrap().is_empty());
        assert_eq!(b.result(), GameResult::Won);

        let mut b = GameState::new(Side::B);
        b.apply_remote(&MoveRecord::disconnect_notice()).unwrap();
        assert_eq!(b.result(), GameResult::OpponentDisconnected);

        // 已结束后再收到终局信号不改变结果
        b.apply_remote(&MoveRecord::resign()).unwrap();
        assert_eq!(b.result(), GameResult::OpponentDisconnected);
    }

    #[test]
    fn test_resign_and_connection_lost() {
        let mut a = GameState::new(Side::A);
        assert_eq!(a.resign().unwrap(), vec![MoveRecord::resign()]);
        assert_eq!(a.result(), GameResult::Lost);
        a.connection_lost();
        assert_eq!(a.result(), GameResult::Lost);

        let mut b = GameState::new(Side::B);
        b.connection_lost();
        assert_eq!(b.result(), GameResult::OpponentDisconnected);
        assert_eq!(b.select_piece(sq(1, 0)), Err(ChessError::GameOver));
    }

    #[test]
    fn test_playout_keeps_boards_in_sync() {
        let (mut a, mut b) = pair();

        for ply in 0..40 {
            if a.result().is_over() || b.result().is_over() {
                break;
            }
            let (mover, receiver) = if ply % 2 == 0 { (&mut a, &mut b) } else { (&mut b, &mut a) };

            let side = mover.me();
            let mut choices = Vec::new();
            for (from, _) in mover.board().pieces(side) {
                for to in MoveGenerator::legal_moves(mover.board(), from, mover.last_move()) {
                    choices.push((from, to));
                }
            }
            assert!(!choices.is_empty());
            let (from, to) = choices[(ply * 7 + 3) % choices.len()];

            mover.select_piece(from).unwrap();
            let outbox = mover.attempt_move(to).unwrap();
            for record in &outbox {
                for reply in receiver.apply_remote(record).unwrap() {
                    mover.apply_remote(&reply).unwrap();
                }
            }

            assert_eq!(mover.board(), receiver.board());
            assert!(!crate::CheckOracle::king_in_check(mover.board(), side, mover.last_move()));
        }
    }
}
