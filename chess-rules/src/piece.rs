//! 棋子定义

use protocol::Side;

/// 棋子类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

/// 非兵棋子的走法几何
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// 方向（行增量, 列增量）
    pub directions: &'static [(i8, i8)],
    /// 是否沿方向一直滑行直到边界或遇到棋子
    pub sliding: bool,
}

const ORTHOGONAL: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const DIAGONAL: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
const ALL_DIRECTIONS: [(i8, i8); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];
const KNIGHT_JUMPS: [(i8, i8); 8] = [
    (-2, 1),
    (2, -1),
    (-2, -1),
    (2, 1),
    (1, 2),
    (-1, -2),
    (-1, 2),
    (1, -2),
];

impl PieceKind {
    /// 走法几何；兵的走法依赖阵营和上一步，单独处理，返回 None
    pub fn geometry(&self) -> Option<Geometry> {
        match self {
            PieceKind::Pawn => None,
            PieceKind::Knight => Some(Geometry {
                directions: &KNIGHT_JUMPS,
                sliding: false,
            }),
            PieceKind::Bishop => Some(Geometry {
                directions: &DIAGONAL,
                sliding: true,
            }),
            PieceKind::Rook => Some(Geometry {
                directions: &ORTHOGONAL,
                sliding: true,
            }),
            PieceKind::Queen => Some(Geometry {
                directions: &ALL_DIRECTIONS,
                sliding: true,
            }),
            PieceKind::King => Some(Geometry {
                directions: &ALL_DIRECTIONS,
                sliding: false,
            }),
        }
    }

    /// 文本符号（A 方大写，B 方小写）
    pub fn to_char(&self, side: Side) -> char {
        let c = match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        };
        match side {
            Side::A => c.to_ascii_uppercase(),
            Side::B => c,
        }
    }
}

/// 棋子
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub owner: Side,
    /// 是否移动过（只对王和车有意义，用于判断能否易位）
    pub ever_moved: bool,
}

impl Piece {
    /// 创建新棋子
    pub fn new(kind: PieceKind, owner: Side) -> Self {
        Self {
            kind,
            owner,
            ever_moved: false,
        }
    }

    /// 标记为已移动；单向，不会被复原
    pub fn mark_moved(&mut self) {
        if matches!(self.kind, PieceKind::King | PieceKind::Rook) {
            self.ever_moved = true;
        }
    }

    /// 是否还保有易位资格
    pub fn can_castle(&self) -> bool {
        matches!(self.kind, PieceKind::King | PieceKind::Rook) && !self.ever_moved
    }

    /// 文本符号
    pub fn to_char(&self) -> char {
        self.kind.to_char(self.owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_piece_chars() {
        assert_eq!(Piece::new(PieceKind::King, Side::A).to_char(), 'K');
        assert_eq!(Piece::new(PieceKind::Knight, Side::B).to_char(), 'n');
    }

    #[test]
    fn test_geometry() {
        assert!(PieceKind::Pawn.geometry().is_none());
        let rook = PieceKind::Rook.geometry().unwrap();
        assert!(rook.sliding);
        assert_eq!(rook.directions.len(), 4);
        let king = PieceKind::King.geometry().unwrap();
        assert!(!king.sliding);
        assert_eq!(king.directions.len(), 8);
    }

    #[test]
    fn test_moved_flag_only_for_king_and_rook() {
        let mut knight = Piece::new(PieceKind::Knight, Side::A);
        knight.mark_moved();
        assert!(!knight.ever_moved);

        let mut rook = Piece::new(PieceKind::Rook, Side::A);
        assert!(rook.can_castle());
        rook.mark_moved();
        assert!(rook.ever_moved);
        assert!(!rook.can_castle());
    }
}
