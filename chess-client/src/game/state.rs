//! 展示层看到的对局快照

use chess_rules::{Board, GameState};
use protocol::{GameResult, MoveRecord, Side, Square};

/// 对局快照
///
/// 每次状态变化后由对局任务发布，展示层只读。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameView {
    pub board: Board,
    /// 本方阵营
    pub me: Side,
    /// 当前走子方
    pub turn: Side,
    /// 选中的棋子
    pub selected: Option<Square>,
    /// 选中棋子的合法落点
    pub targets: Vec<Square>,
    /// 最后一步
    pub last_move: Option<MoveRecord>,
    pub result: GameResult,
    /// 最近一次操作被拒绝的原因
    pub notice: Option<String>,
}

impl GameView {
    pub fn from_state(state: &GameState, notice: Option<String>) -> Self {
        Self {
            board: state.board().clone(),
            me: state.me(),
            turn: state.turn(),
            selected: state.selected(),
            targets: state.legal_targets(),
            last_move: state.last_move().copied(),
            result: state.result(),
            notice,
        }
    }

    /// 是否轮到本方走棋
    pub fn is_my_turn(&self) -> bool {
        self.turn == self.me && !self.result.is_over()
    }
}
