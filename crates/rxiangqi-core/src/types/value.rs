//! 評価値（Value）
//!
//! `Value::MATE` 付近を詰みスコアとして予約している。
//! 通常の評価値は [-MATE_IN_MAX_PLY, MATE_IN_MAX_PLY] の範囲で用いる。

use super::MAX_PLY;

/// 評価値（センチポーン相当）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct Value(i32);

impl Value {
    /// ゼロ
    pub const ZERO: Value = Value(0);
    /// 引き分け
    pub const DRAW: Value = Value(0);
    /// 詰み（勝ち側の最大スコア）
    pub const MATE: Value = Value(32000);
    /// 無限大
    pub const INFINITE: Value = Value(32001);
    /// 無効値
    pub const NONE: Value = Value(32002);

    /// 最大探索深度内での詰みスコア
    pub const MATE_IN_MAX_PLY: Value = Value(Self::MATE.0 - MAX_PLY);
    /// 最大探索深度内での詰まされスコア
    pub const MATED_IN_MAX_PLY: Value = Value(-Self::MATE_IN_MAX_PLY.0);

    /// 値から生成
    #[inline]
    pub const fn new(v: i32) -> Value {
        Value(v)
    }

    /// ply手で詰ますスコア
    #[inline]
    pub const fn mate_in(ply: i32) -> Value {
        Value(Self::MATE.0 - ply)
    }

    /// ply手で詰まされるスコア
    #[inline]
    pub const fn mated_in(ply: i32) -> Value {
        Value(-Self::MATE.0 + ply)
    }

    /// 勝ちスコアかどうか
    #[inline]
    pub const fn is_win(self) -> bool {
        self.0 >= Self::MATE_IN_MAX_PLY.0
    }

    /// 負けスコアかどうか
    #[inline]
    pub const fn is_loss(self) -> bool {
        self.0 <= Self::MATED_IN_MAX_PLY.0
    }

    /// 詰みスコア（勝ちまたは負け）かどうか
    #[inline]
    pub const fn is_mate_score(self) -> bool {
        self.is_win() || self.is_loss()
    }

    /// 生の値を取得
    #[inline]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// 置換表格納用に ply を補正（詰みスコアをルートからの距離からノードからの距離へ）
    #[inline]
    pub const fn to_tt(self, ply: i32) -> Value {
        if self.is_win() {
            Value(self.0 + ply)
        } else if self.is_loss() {
            Value(self.0 - ply)
        } else {
            self
        }
    }

    /// 置換表から読んだ値を現在の ply に戻す
    #[inline]
    pub const fn from_tt(self, ply: i32) -> Value {
        if self.is_win() {
            Value(self.0 - ply)
        } else if self.is_loss() {
            Value(self.0 + ply)
        } else {
            self
        }
    }
}

impl std::ops::Neg for Value {
    type Output = Value;

    #[inline]
    fn neg(self) -> Value {
        Value(-self.0)
    }
}

impl std::ops::Add<i32> for Value {
    type Output = Value;

    #[inline]
    fn add(self, rhs: i32) -> Value {
        Value(self.0 + rhs)
    }
}

impl std::ops::Sub<i32> for Value {
    type Output = Value;

    #[inline]
    fn sub(self, rhs: i32) -> Value {
        Value(self.0 - rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mate_scores() {
        assert!(Value::mate_in(5).is_win());
        assert!(Value::mated_in(5).is_loss());
        assert!(!Value::new(300).is_mate_score());
        assert_eq!(-Value::mate_in(3), Value::mated_in(3));
    }

    #[test]
    fn test_tt_adjust_roundtrip() {
        let v = Value::mate_in(7);
        assert_eq!(v.to_tt(4).from_tt(4), v);
        let v = Value::new(-120);
        assert_eq!(v.to_tt(10), v);
    }
}
