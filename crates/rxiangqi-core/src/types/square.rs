//! 升（Square）
//!
//! 9筋 × 10段 = 90升。インデックスは `rank * 9 + file`。
//! 筋は a..i（0..8）、段は 0..9 で、紅の最下段が 0。

use super::Color;
use std::fmt;

/// 升
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Square(u8);

impl Square {
    /// 筋の数
    pub const FILE_NUM: usize = 9;
    /// 段の数
    pub const RANK_NUM: usize = 10;
    /// 升の数
    pub const NUM: usize = Self::FILE_NUM * Self::RANK_NUM;

    /// 筋・段から生成（範囲外は None）
    #[inline]
    pub const fn new(file: i32, rank: i32) -> Option<Square> {
        if file < 0 || file >= Self::FILE_NUM as i32 || rank < 0 || rank >= Self::RANK_NUM as i32 {
            return None;
        }
        Some(Square((rank * Self::FILE_NUM as i32 + file) as u8))
    }

    /// インデックスから生成
    #[inline]
    pub const fn from_index(index: usize) -> Option<Square> {
        if index < Self::NUM {
            Some(Square(index as u8))
        } else {
            None
        }
    }

    /// 範囲検査なしで生成（呼び出し側で 0..90 を保証する）
    #[inline]
    pub(crate) const fn from_raw(raw: u8) -> Square {
        debug_assert!((raw as usize) < Self::NUM);
        Square(raw)
    }

    /// インデックス
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// 筋（0..9）
    #[inline]
    pub const fn file(self) -> i32 {
        (self.0 % Self::FILE_NUM as u8) as i32
    }

    /// 段（0..10）
    #[inline]
    pub const fn rank(self) -> i32 {
        (self.0 / Self::FILE_NUM as u8) as i32
    }

    /// 相対移動（盤外は None）
    #[inline]
    pub const fn offset(self, df: i32, dr: i32) -> Option<Square> {
        Square::new(self.file() + df, self.rank() + dr)
    }

    /// 指定手番から見た段（自陣最下段が 0）
    #[inline]
    pub const fn relative_rank(self, color: Color) -> i32 {
        match color {
            Color::Red => self.rank(),
            Color::Black => 9 - self.rank(),
        }
    }

    /// 紅視点に正規化した升（黒の駒位置表参照用）
    #[inline]
    pub const fn relative(self, color: Color) -> Square {
        match color {
            Color::Red => self,
            Color::Black => Square(((9 - self.rank()) * Self::FILE_NUM as i32 + self.file()) as u8),
        }
    }

    /// 九宮内か
    #[inline]
    pub const fn in_palace(self, color: Color) -> bool {
        let f = self.file();
        let r = self.relative_rank(color);
        f >= 3 && f <= 5 && r <= 2
    }

    /// 河を越えているか（相手陣にいるか）
    #[inline]
    pub const fn crossed_river(self, color: Color) -> bool {
        self.relative_rank(color) >= 5
    }

    /// 座標表記（例: `h2`）から変換
    pub fn from_coord(s: &str) -> Option<Square> {
        let mut chars = s.chars();
        let f = chars.next()?;
        let r = chars.next()?;
        if chars.next().is_some() || !('a'..='i').contains(&f) {
            return None;
        }
        let rank = r.to_digit(10)? as i32;
        Square::new(f as i32 - 'a' as i32, rank)
    }

    /// 全升を列挙
    pub fn all() -> impl Iterator<Item = Square> {
        (0..Self::NUM as u8).map(Square)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let file = (b'a' + self.file() as u8) as char;
        write!(f, "{file}{}", self.rank())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_coord_roundtrip() {
        let sq = Square::from_coord("h2").unwrap();
        assert_eq!(sq.file(), 7);
        assert_eq!(sq.rank(), 2);
        assert_eq!(sq.to_string(), "h2");
        assert!(Square::from_coord("j0").is_none());
        assert!(Square::from_coord("a").is_none());
        assert!(Square::from_coord("a10").is_none());
    }

    #[test]
    fn test_palace() {
        let e0 = Square::from_coord("e0").unwrap();
        let e9 = Square::from_coord("e9").unwrap();
        let c1 = Square::from_coord("c1").unwrap();
        assert!(e0.in_palace(Color::Red));
        assert!(!e0.in_palace(Color::Black));
        assert!(e9.in_palace(Color::Black));
        assert!(!c1.in_palace(Color::Red));
    }

    #[test]
    fn test_river() {
        let a4 = Square::from_coord("a4").unwrap();
        let a5 = Square::from_coord("a5").unwrap();
        assert!(!a4.crossed_river(Color::Red));
        assert!(a5.crossed_river(Color::Red));
        assert!(a4.crossed_river(Color::Black));
        assert!(!a5.crossed_river(Color::Black));
    }

    #[test]
    fn test_relative() {
        let a0 = Square::from_coord("a0").unwrap();
        assert_eq!(a0.relative(Color::Red), a0);
        assert_eq!(a0.relative(Color::Black), Square::from_coord("a9").unwrap());
    }
}
