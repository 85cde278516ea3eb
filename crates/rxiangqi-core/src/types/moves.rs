//! 指し手（Move）
//!
//! 移動元・移動先の2升を16bitに詰める。表記はUCCI/UCI互換の座標形式（例: `h2e2`）。

use super::Square;
use std::fmt;

/// 指し手
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Move(u16);

impl Move {
    /// 無効手（from == to == 0 は合法手になり得ない）
    pub const NONE: Move = Move(0);

    #[inline]
    pub const fn new(from: Square, to: Square) -> Move {
        Move((from.index() as u16) | ((to.index() as u16) << 7))
    }

    /// 移動元
    #[inline]
    pub const fn from(self) -> Square {
        Square::from_raw((self.0 & 0x7f) as u8)
    }

    /// 移動先
    #[inline]
    pub const fn to(self) -> Square {
        Square::from_raw((self.0 >> 7) as u8)
    }

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// 置換表格納用の生値
    #[inline]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// 生値から復元（範囲外は NONE）
    #[inline]
    pub const fn from_raw(raw: u16) -> Move {
        let from = (raw & 0x7f) as usize;
        let to = (raw >> 7) as usize;
        if from < Square::NUM && to < Square::NUM {
            Move(raw)
        } else {
            Move::NONE
        }
    }

    /// 座標表記から変換（合法性は検査しない）
    pub fn from_uci(s: &str) -> Option<Move> {
        if s.len() != 4 || !s.is_ascii() {
            return None;
        }
        let from = Square::from_coord(&s[0..2])?;
        let to = Square::from_coord(&s[2..4])?;
        if from == to {
            return None;
        }
        Some(Move::new(from, to))
    }

    /// 座標表記
    pub fn to_uci(self) -> String {
        if self.is_none() {
            return "0000".to_string();
        }
        format!("{}{}", self.from(), self.to())
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_uci())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_uci() {
        let mv = Move::from_uci("h2e2").unwrap();
        assert_eq!(mv.from(), Square::from_coord("h2").unwrap());
        assert_eq!(mv.to(), Square::from_coord("e2").unwrap());
        assert_eq!(mv.to_uci(), "h2e2");
        assert_eq!(Move::from_raw(mv.raw()), mv);
    }

    #[test]
    fn test_move_invalid() {
        assert!(Move::from_uci("h2h2").is_none());
        assert!(Move::from_uci("h2e").is_none());
        assert!(Move::from_uci("z2e2").is_none());
        assert_eq!(Move::NONE.to_uci(), "0000");
        assert!(Move::from_raw(u16::MAX).is_none());
    }
}
