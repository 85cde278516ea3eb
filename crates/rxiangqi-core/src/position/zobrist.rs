//! Zobristハッシュ乱数テーブル
//!
//! 乱数は固定シードの Xoshiro256** で生成するため、実行ごとに同じキーになる。

use std::sync::LazyLock;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

use crate::types::{Piece, Square};

const ZOBRIST_SEED: u64 = 0x5851_F42D_4C95_7F2D;

pub struct Zobrist {
    psq: [[u64; Square::NUM]; Piece::NUM],
    side: u64,
}

impl Zobrist {
    fn generate() -> Self {
        let mut rng = Xoshiro256StarStar::seed_from_u64(ZOBRIST_SEED);
        let mut psq = [[0u64; Square::NUM]; Piece::NUM];
        for table in psq.iter_mut() {
            for key in table.iter_mut() {
                *key = rng.random::<u64>();
            }
        }
        Self {
            psq,
            side: rng.random::<u64>(),
        }
    }
}

pub static ZOBRIST: LazyLock<Zobrist> = LazyLock::new(Zobrist::generate);

/// 駒×升のキー
#[inline]
pub fn zobrist_psq(pc: Piece, sq: Square) -> u64 {
    ZOBRIST.psq[pc.index()][sq.index()]
}

/// 手番のキー（黒番のときに XOR される）
#[inline]
pub fn zobrist_side() -> u64 {
    ZOBRIST.side
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Color, PieceType};

    #[test]
    fn test_keys_distinct() {
        let a = zobrist_psq(Piece::new(Color::Red, PieceType::Rook), Square::from_index(0).unwrap());
        let b = zobrist_psq(Piece::new(Color::Black, PieceType::Rook), Square::from_index(0).unwrap());
        assert_ne!(a, b);
        assert_ne!(zobrist_side(), 0);
    }
}
