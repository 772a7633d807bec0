//! 握手消息与对局结果

use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::square::Side;

/// 连接准入信号（握手阶段的单个裸字节，不走帧编码）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Admission {
    /// 服务端已满
    Rejected = 0,
    /// 已接受，进入等待队列
    Accepted = 1,
}

impl Admission {
    /// 编码为字节
    pub fn to_byte(self) -> u8 {
        self as u8
    }

    /// 从字节解析
    pub fn from_byte(byte: u8) -> Result<Self, ProtocolError> {
        match byte {
            0 => Ok(Admission::Rejected),
            1 => Ok(Admission::Accepted),
            _ => Err(ProtocolError::MalformedHandshake { byte }),
        }
    }
}

/// 配对成功，告知本方阵营
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchFound {
    /// 阵营编号（0 或 1）
    pub side_id: u8,
}

impl MatchFound {
    pub fn new(side: Side) -> Self {
        Self { side_id: side.id() }
    }

    /// 解析阵营
    pub fn side(&self) -> Option<Side> {
        Side::from_id(self.side_id)
    }
}

/// 对局结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameResult {
    /// 进行中
    #[default]
    InProgress,
    /// 对手断线
    OpponentDisconnected,
    /// 本方获胜
    Won,
    /// 本方被将死（或认输）
    Lost,
}

impl GameResult {
    /// 展示层使用的结果码：0 对手断线，1 胜，2 负
    pub fn code(&self) -> Option<u8> {
        match self {
            GameResult::InProgress => None,
            GameResult::OpponentDisconnected => Some(0),
            GameResult::Won => Some(1),
            GameResult::Lost => Some(2),
        }
    }

    /// 是否已结束
    pub fn is_over(&self) -> bool {
        !matches!(self, GameResult::InProgress)
    }
}

impl std::fmt::Display for GameResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            GameResult::InProgress => "in progress",
            GameResult::OpponentDisconnected => "opponent disconnected",
            GameResult::Won => "you won",
            GameResult::Lost => "you lost",
        };
        f.write_str(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admission_bytes() {
        assert_eq!(Admission::from_byte(1).unwrap(), Admission::Accepted);
        assert_eq!(Admission::from_byte(0).unwrap(), Admission::Rejected);
        assert!(matches!(
            Admission::from_byte(b'x'),
            Err(ProtocolError::MalformedHandshake { byte: b'x' })
        ));
    }

    #[test]
    fn test_match_found_serialize() {
        let msg = MatchFound::new(Side::B);
        let bytes = bincode::serialize(&msg).unwrap();
        let decoded: MatchFound = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded.side(), Some(Side::B));
    }

    #[test]
    fn test_result_codes() {
        assert_eq!(GameResult::OpponentDisconnected.code(), Some(0));
        assert_eq!(GameResult::Won.code(), Some(1));
        assert_eq!(GameResult::Lost.code(), Some(2));
        assert_eq!(GameResult::InProgress.code(), None);
        assert!(!GameResult::default().is_over());
    }
}
