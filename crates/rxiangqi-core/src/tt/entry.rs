//! 置換表エントリ
//!
//! 1エントリは `AtomicU64` 2つ（`key ^ data` と `data`）で構成する。
//! 読み出し時に `key ^ data` を検証し、並列書き込みで壊れたエントリは不一致として捨てる。

use std::sync::atomic::{AtomicU64, Ordering};

use crate::types::{Depth, Move, Value};

/// 評価値の種類
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Bound {
    None = 0,
    /// fail-low（真の値は以下）
    Upper = 1,
    /// fail-high（真の値は以上）
    Lower = 2,
    Exact = 3,
}

impl Bound {
    const fn from_bits(bits: u64) -> Bound {
        match bits & 3 {
            1 => Bound::Upper,
            2 => Bound::Lower,
            3 => Bound::Exact,
            _ => Bound::None,
        }
    }

    /// `Lower` / `Exact` か
    #[inline]
    pub const fn includes_lower(self) -> bool {
        (self as u8) & 2 != 0
    }

    /// `Upper` / `Exact` か
    #[inline]
    pub const fn includes_upper(self) -> bool {
        (self as u8) & 1 != 0
    }
}

/// 深さの格納オフセット（静止探索の負の深さも保持する）
pub(super) const DEPTH_OFFSET: Depth = -8;

/// 読み出したエントリの内容
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TTData {
    pub mv: Move,
    pub value: Value,
    pub eval: Value,
    pub depth: Depth,
    pub bound: Bound,
}

// data のビット配置
// 0..16  move
// 16..32 value (i16)
// 32..48 eval (i16)
// 48..56 depth - DEPTH_OFFSET
// 56..58 bound
// 58..64 generation
const GENERATION_SHIFT: u32 = 58;

#[inline]
pub(super) fn pack(data: &TTData, generation: u8) -> u64 {
    let depth8 = (data.depth - DEPTH_OFFSET).clamp(1, u8::MAX as i32) as u64;
    (data.mv.raw() as u64)
        | ((data.value.raw() as i16 as u16 as u64) << 16)
        | ((data.eval.raw() as i16 as u16 as u64) << 32)
        | (depth8 << 48)
        | ((data.bound as u64) << 56)
        | ((generation as u64) << GENERATION_SHIFT)
}

#[inline]
pub(super) fn unpack(bits: u64) -> TTData {
    TTData {
        mv: Move::from_raw(bits as u16),
        value: Value::new((bits >> 16) as u16 as i16 as i32),
        eval: Value::new((bits >> 32) as u16 as i16 as i32),
        depth: ((bits >> 48) & 0xFF) as i32 + DEPTH_OFFSET,
        bound: Bound::from_bits(bits >> 56),
    }
}

#[inline]
pub(super) fn generation_of(bits: u64) -> u8 {
    (bits >> GENERATION_SHIFT) as u8
}

/// 置換表エントリ
#[derive(Default)]
pub(super) struct TTEntry {
    key_xor: AtomicU64,
    data: AtomicU64,
}

impl TTEntry {
    /// `(key, data)` を読む。未使用なら `data == 0`
    #[inline]
    pub(super) fn load(&self) -> (u64, u64) {
        let data = self.data.load(Ordering::Relaxed);
        let key = self.key_xor.load(Ordering::Relaxed) ^ data;
        (key, data)
    }

    #[inline]
    pub(super) fn save(&self, key: u64, data: u64) {
        self.key_xor.store(key ^ data, Ordering::Relaxed);
        self.data.store(data, Ordering::Relaxed);
    }

    #[inline]
    pub(super) fn reset(&self) {
        self.key_xor.store(0, Ordering::Relaxed);
        self.data.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_unpack() {
        let data = TTData {
            mv: Move::from_uci("h2e2").unwrap(),
            value: Value::new(-1234),
            eval: Value::new(56),
            depth: 12,
            bound: Bound::Lower,
        };
        let bits = pack(&data, 17);
        assert_eq!(unpack(bits), data);
        assert_eq!(generation_of(bits), 17);

        let qs = TTData {
            depth: -1,
            value: Value::mated_in(3),
            ..data
        };
        assert_eq!(unpack(pack(&qs, 0)), qs);
    }

    #[test]
    fn test_bound_flags() {
        assert!(Bound::Exact.includes_lower() && Bound::Exact.includes_upper());
        assert!(Bound::Lower.includes_lower() && !Bound::Lower.includes_upper());
        assert!(!Bound::None.includes_lower() && !Bound::None.includes_upper());
    }
}
