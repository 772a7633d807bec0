//! 坐标与阵营

use serde::{Deserialize, Serialize};

use crate::constants::BOARD_SIZE;

/// 阵营
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// A 方（先手，占据第 6/7 行，兵向第 0 行前进）
    A,
    /// B 方（后手，占据第 0/1 行，兵向第 7 行前进）
    B,
}

impl Side {
    /// 获取对方阵营
    pub fn opponent(&self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    /// 线上编号（A = 0，B = 1）
    pub fn id(&self) -> u8 {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }

    /// 从线上编号解析
    pub fn from_id(id: u8) -> Option<Side> {
        match id {
            0 => Some(Side::A),
            1 => Some(Side::B),
            _ => None,
        }
    }

    /// 兵的前进方向（行增量）
    pub fn forward(&self) -> i8 {
        match self {
            Side::A => -1,
            Side::B => 1,
        }
    }

    /// 底线所在行
    pub fn back_rank(&self) -> u8 {
        match self {
            Side::A => 7,
            Side::B => 0,
        }
    }

    /// 兵的初始行
    pub fn pawn_rank(&self) -> u8 {
        match self {
            Side::A => 6,
            Side::B => 1,
        }
    }

    /// 可以吃过路兵时本方兵所在的行
    pub fn en_passant_rank(&self) -> u8 {
        match self {
            Side::A => 3,
            Side::B => 4,
        }
    }

    /// 兵升变所在行
    pub fn promotion_rank(&self) -> u8 {
        self.opponent().back_rank()
    }
}

/// 棋盘格子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Square {
    /// 行 (0-7)
    pub row: u8,
    /// 列 (0-7)
    pub col: u8,
}

impl Square {
    /// 创建新格子
    pub fn new(row: u8, col: u8) -> Option<Self> {
        if (row as usize) < BOARD_SIZE && (col as usize) < BOARD_SIZE {
            Some(Self { row, col })
        } else {
            None
        }
    }

    /// 创建新格子（不检查边界，内部使用）
    pub const fn new_unchecked(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// 检查是否在棋盘内
    pub fn is_valid(&self) -> bool {
        (self.row as usize) < BOARD_SIZE && (self.col as usize) < BOARD_SIZE
    }

    /// 获取偏移后的格子
    pub fn offset(&self, d_row: i8, d_col: i8) -> Option<Square> {
        let row = self.row as i8 + d_row;
        let col = self.col as i8 + d_col;
        if row >= 0 && (row as usize) < BOARD_SIZE && col >= 0 && (col as usize) < BOARD_SIZE {
            Some(Square {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    /// 转换为数组索引
    pub fn to_index(&self) -> usize {
        self.row as usize * BOARD_SIZE + self.col as usize
    }

    /// 遍历全部 64 个格子（按行优先）
    pub fn all() -> impl Iterator<Item = Square> {
        (0..BOARD_SIZE * BOARD_SIZE).map(|i| Square {
            row: (i / BOARD_SIZE) as u8,
            col: (i % BOARD_SIZE) as u8,
        })
    }
}

impl std::fmt::Display for Square {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}
