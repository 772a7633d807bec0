//! 终端输入处理
//!
//! 支持的命令：
//! - `r c`：选中棋子
//! - `r c r c`：选中并落子
//! - `> r c`：把已选中的棋子落到该格
//! - `resign`：认输
//! - `help`：显示帮助
//!
//! 对局之间的菜单只接受重试或退出。

use protocol::Square;
use thiserror::Error;

/// 对局事件（展示层 -> 对局任务）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameEvent {
    /// 选择棋子
    SelectPiece(Square),
    /// 落子
    DropPiece(Square),
    /// 认输
    Resign,
}

/// 一行输入的解析结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Events(Vec<GameEvent>),
    Help,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Empty input")]
    Empty,

    #[error("Not a coordinate: {0}")]
    NotANumber(String),

    #[error("Square out of range: ({row}, {col})")]
    OutOfRange { row: u8, col: u8 },

    #[error("Expected 2 or 4 coordinates, got {0}")]
    WrongArity(usize),
}

pub const HELP: &str = "commands: `r c` select, `r c r c` move, `> r c` drop selected piece, `resign`, `help`";

/// 解析一行输入
pub fn parse_command(line: &str) -> Result<Command, InputError> {
    let line = line.trim();
    match line {
        "" => return Err(InputError::Empty),
        "resign" => return Ok(Command::Events(vec![GameEvent::Resign])),
        "help" | "?" => return Ok(Command::Help),
        _ => {}
    }

    if let Some(rest) = line.strip_prefix('>') {
        let squares = parse_squares(rest)?;
        return match squares.as_slice() {
            [to] => Ok(Command::Events(vec![GameEvent::DropPiece(*to)])),
            _ => Err(InputError::WrongArity(squares.len() * 2)),
        };
    }

    let squares = parse_squares(line)?;
    match squares.as_slice() {
        [from] => Ok(Command::Events(vec![GameEvent::SelectPiece(*from)])),
        [from, to] => Ok(Command::Events(vec![
            GameEvent::SelectPiece(*from),
            GameEvent::DropPiece(*to),
        ])),
        _ => Err(InputError::WrongArity(squares.len() * 2)),
    }
}

/// 菜单选项（无法加入或对局结束后）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    /// 重新连接中继
    Retry,
    /// 退出程序
    Quit,
}

pub const MENU_PROMPT: &str = "Play again? [y]es / [n]o";

/// 解析菜单输入，无法识别时返回 None
pub fn parse_menu_choice(line: &str) -> Option<MenuChoice> {
    match line.trim().to_ascii_lowercase().as_str() {
        "" | "y" | "yes" | "r" | "retry" => Some(MenuChoice::Retry),
        "n" | "no" | "q" | "quit" | "exit" => Some(MenuChoice::Quit),
        _ => None,
    }
}

/// 把空白或逗号分隔的数字两两组成格子
fn parse_squares(text: &str) -> Result<Vec<Square>, InputError> {
    let numbers = text
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<u8>()
                .map_err(|_| InputError::NotANumber(token.to_string()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if numbers.len() % 2 != 0 {
        return Err(InputError::WrongArity(numbers.len()));
    }

    numbers
        .chunks(2)
        .map(|pair| {
            Square::new(pair[0], pair[1]).ok_or(InputError::OutOfRange {
                row: pair[0],
                col: pair[1],
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(row: u8, col: u8) -> Square {
        Square::new_unchecked(row, col)
    }

    #[test]
    fn test_select_and_move() {
        assert_eq!(
            parse_command("6 4").unwrap(),
            Command::Events(vec![GameEvent::SelectPiece(sq(6, 4))])
        );
        assert_eq!(
            parse_command(" 6,4  4,4 ").unwrap(),
            Command::Events(vec![
                GameEvent::SelectPiece(sq(6, 4)),
                GameEvent::DropPiece(sq(4, 4)),
            ])
        );
        assert_eq!(
            parse_command("> 4 4").unwrap(),
            Command::Events(vec![GameEvent::DropPiece(sq(4, 4))])
        );
    }

    #[test]
    fn test_keywords() {
        assert_eq!(
            parse_command("resign").unwrap(),
            Command::Events(vec![GameEvent::Resign])
        );
        assert_eq!(parse_command("help").unwrap(), Command::Help);
    }

    #[test]
    fn test_menu_choice() {
        assert_eq!(parse_menu_choice(""), Some(MenuChoice::Retry));
        assert_eq!(parse_menu_choice(" Yes "), Some(MenuChoice::Retry));
        assert_eq!(parse_menu_choice("q"), Some(MenuChoice::Quit));
        assert_eq!(parse_menu_choice("NO"), Some(MenuChoice::Quit));
        assert_eq!(parse_menu_choice("6 4"), None);
    }

    #[test]
    fn test_bad_input() {
        assert_eq!(parse_command("   "), Err(InputError::Empty));
        assert_eq!(
            parse_command("a 1"),
            Err(InputError::NotANumber("a".to_string()))
        );
        assert_eq!(parse_command("1 2 3"), Err(InputError::WrongArity(3)));
        assert_eq!(parse_command("> 1 2 3 4"), Err(InputError::WrongArity(4)));
        assert_eq!(
            parse_command("8 0"),
            Err(InputError::OutOfRange { row: 8, col: 0 })
        );
    }
}
