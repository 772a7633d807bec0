//! 棋盘文本渲染
//!
//! 从本方视角绘制：本方底线总在最下面，B 方看到的棋盘旋转 180 度。

use std::fmt::Write;

use protocol::{Side, Square, BOARD_SIZE};

use crate::game::GameView;

/// 格子前缀标记
fn marker(view: &GameView, sq: Square) -> char {
    if view.selected == Some(sq) {
        '>'
    } else if view.targets.contains(&sq) {
        '*'
    } else if view.last_move.and_then(|m| m.from_to()).map(|(_, to)| to) == Some(sq) {
        '+'
    } else {
        ' '
    }
}

/// 按视角排列的行列顺序
fn axis(me: Side) -> Vec<u8> {
    let forward = 0..BOARD_SIZE as u8;
    match me {
        Side::A => forward.collect(),
        Side::B => forward.rev().collect(),
    }
}

/// 渲染棋盘和状态行
pub fn render_view(view: &GameView) -> String {
    let mut out = String::new();
    let order = axis(view.me);

    // 列号
    let _ = write!(out, "  ");
    for &col in &order {
        let _ = write!(out, " {}", col);
    }
    let _ = writeln!(out);

    for &row in &order {
        let _ = write!(out, "{} ", row);
        for &col in &order {
            let sq = Square::new_unchecked(row, col);
            let piece = view.board.get(sq).map(|p| p.to_char()).unwrap_or('.');
            let _ = write!(out, "{}{}", marker(view, sq), piece);
        }
        let _ = writeln!(out);
    }

    let _ = writeln!(out, "{}", status_line(view));
    if let Some(notice) = &view.notice {
        let _ = writeln!(out, "! {}", notice);
    }
    out
}

/// 状态行
pub fn status_line(view: &GameView) -> String {
    if let Some(code) = view.result.code() {
        return format!("Game over: {} (code {})", view.result, code);
    }

    let who = if view.is_my_turn() { "your move" } else { "waiting for opponent" };
    match view.last_move {
        Some(last) => format!("You are {:?}, {} (last: {})", view.me, who, last),
        None => format!("You are {:?}, {}", view.me, who),
    }
}
