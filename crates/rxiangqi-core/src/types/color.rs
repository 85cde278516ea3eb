//! 手番（Color）

/// 手番（紅/黒）
///
/// 象棋では紅（Red）が先手。FEN上の手番文字は紅が `w`、黒が `b`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Color {
    Red = 0,
    Black = 1,
}

impl Color {
    /// 手番の数
    pub const NUM: usize = 2;

    /// 全ての手番
    pub const ALL: [Color; 2] = [Color::Red, Color::Black];

    /// 相手番を返す
    #[inline]
    pub const fn opponent(self) -> Color {
        match self {
            Color::Red => Color::Black,
            Color::Black => Color::Red,
        }
    }

    /// インデックスとして使用（配列アクセス用）
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// FENの手番文字
    #[inline]
    pub const fn fen_char(self) -> char {
        match self {
            Color::Red => 'w',
            Color::Black => 'b',
        }
    }

    /// FENの手番文字から変換（`r` も紅として受け付ける）
    pub const fn from_fen_char(c: char) -> Option<Color> {
        match c {
            'w' | 'r' => Some(Color::Red),
            'b' => Some(Color::Black),
            _ => None,
        }
    }
}

impl std::ops::Not for Color {
    type Output = Color;

    #[inline]
    fn not(self) -> Color {
        self.opponent()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_opponent() {
        assert_eq!(Color::Red.opponent(), Color::Black);
        assert_eq!(Color::Black.opponent(), Color::Red);
    }

    #[test]
    fn test_color_not() {
        assert_eq!(!Color::Red, Color::Black);
        assert_eq!(!Color::Black, Color::Red);
    }

    #[test]
    fn test_color_fen_char() {
        assert_eq!(Color::from_fen_char('w'), Some(Color::Red));
        assert_eq!(Color::from_fen_char('r'), Some(Color::Red));
        assert_eq!(Color::from_fen_char('b'), Some(Color::Black));
        assert_eq!(Color::from_fen_char('x'), None);
        assert_eq!(Color::Black.fen_char(), 'b');
    }
}
