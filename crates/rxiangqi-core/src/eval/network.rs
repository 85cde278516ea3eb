//! 評価ネットワーク（駒割り + 駒位置表）の読み込み
//!
//! ファイル形式（リトルエンディアン）:
//!
//! | オフセット | 内容 |
//! |---|---|
//! | 0 | magic `RXQE` |
//! | 4 | version (u32) |
//! | 8 | 駒割り 7 × i16（駒種順） |
//! | 22 | 駒位置表 7 × 90 × i16（紅視点、升インデックス順） |
//! | 1282 | checksum (u32、先行バイトの wrapping sum) |

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail, ensure};

use crate::types::{PieceType, Square};

/// 既定の評価ファイル名（組み込みネットワークの名前を兼ねる）
pub const DEFAULT_EVAL_FILE: &str = "rxiangqi-eval.bin";

const MAGIC: &[u8; 4] = b"RXQE";
const VERSION: u32 = 1;
const PSQ_LEN: usize = PieceType::NUM * Square::NUM;
const PAYLOAD_LEN: usize = 4 + 4 + PieceType::NUM * 2 + PSQ_LEN * 2;
/// ファイル全体のバイト数
pub const FILE_SIZE: usize = PAYLOAD_LEN + 4;

/// 評価ネットワーク
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EvalNetwork {
    /// 読み込み元の名前（`EvalFile` オプションと照合される）
    name: String,
    material: [i16; PieceType::NUM],
    psq: [[i16; Square::NUM]; PieceType::NUM],
}

impl EvalNetwork {
    /// 組み込みネットワーク
    pub fn embedded() -> Self {
        let mut psq = [[0i16; Square::NUM]; PieceType::NUM];
        for pt in PieceType::ALL {
            psq[pt.index()] = *DEFAULT_PSQ[pt.index()];
        }
        Self {
            name: DEFAULT_EVAL_FILE.to_string(),
            material: DEFAULT_MATERIAL,
            psq,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 駒の価値
    #[inline]
    pub fn material(&self, pt: PieceType) -> i32 {
        self.material[pt.index()] as i32
    }

    /// 駒位置評価（`sq` は紅視点に正規化済みであること）
    #[inline]
    pub fn psq(&self, pt: PieceType, sq: Square) -> i32 {
        self.psq[pt.index()][sq.index()] as i32
    }

    /// ファイルから読み込む
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self::from_bytes(&name, &bytes).with_context(|| format!("invalid network {}", path.display()))
    }

    /// バイト列から読み込む
    pub fn from_bytes(name: &str, bytes: &[u8]) -> Result<Self> {
        ensure!(
            bytes.len() == FILE_SIZE,
            "size mismatch: expected {FILE_SIZE} bytes, found {}",
            bytes.len()
        );
        if &bytes[0..4] != MAGIC {
            bail!("invalid magic");
        }
        let version = read_u32(bytes, 4);
        ensure!(version == VERSION, "unsupported version {version}");

        let expected = read_u32(bytes, PAYLOAD_LEN);
        let actual = checksum(&bytes[..PAYLOAD_LEN]);
        ensure!(
            expected == actual,
            "checksum mismatch: expected {expected:#010x}, computed {actual:#010x}"
        );

        let mut offset = 8;
        let mut material = [0i16; PieceType::NUM];
        for v in material.iter_mut() {
            *v = read_i16(bytes, offset);
            offset += 2;
        }
        let mut psq = [[0i16; Square::NUM]; PieceType::NUM];
        for table in psq.iter_mut() {
            for v in table.iter_mut() {
                *v = read_i16(bytes, offset);
                offset += 2;
            }
        }

        log::debug!("network '{name}' parsed (version {version})");
        Ok(Self {
            name: name.to_string(),
            material,
            psq,
        })
    }

    /// ファイル形式へ書き出す
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(FILE_SIZE);
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&VERSION.to_le_bytes());
        for v in self.material {
            out.extend_from_slice(&v.to_le_bytes());
        }
        for table in &self.psq {
            for v in table {
                out.extend_from_slice(&v.to_le_bytes());
            }
        }
        let sum = checksum(&out);
        out.extend_from_slice(&sum.to_le_bytes());
        out
    }
}

impl Default for EvalNetwork {
    fn default() -> Self {
        Self::embedded()
    }
}

fn checksum(bytes: &[u8]) -> u32 {
    bytes.iter().fold(0u32, |acc, &b| acc.wrapping_add(b as u32))
}

#[inline]
fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([bytes[offset], bytes[offset + 1], bytes[offset + 2], bytes[offset + 3]])
}

#[inline]
fn read_i16(bytes: &[u8], offset: usize) -> i16 {
    i16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

// =============================================================================
// 組み込みパラメータ
// =============================================================================

/// 駒割り（帥, 仕, 相, 馬, 車, 炮, 兵）
const DEFAULT_MATERIAL: [i16; PieceType::NUM] = [0, 120, 120, 270, 600, 285, 30];

// 駒位置表は紅視点で段 0 から段 9 へ並べる
#[rustfmt::skip]
const KING_PSQ: [i16; Square::NUM] = [
      0,   0,   0,  -2,   2,  -2,   0,   0,   0,
      0,   0,   0,  -8,  -6,  -8,   0,   0,   0,
      0,   0,   0, -16, -14, -16,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const ADVISOR_PSQ: [i16; Square::NUM] = [
      0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   3,   0,   0,   0,   0,
      0,   0,   0,  -1,   0,  -1,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const BISHOP_PSQ: [i16; Square::NUM] = [
      0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,
     -2,   0,   0,   0,   3,   0,   0,   0,  -2,
      0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,  -1,   0,   0,   0,  -1,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const KNIGHT_PSQ: [i16; Square::NUM] = [
      0,  -4,   0,   0,   0,   0,   0,  -4,   0,
      0,   2,   4,   4,  -2,   4,   4,   2,   0,
      4,   2,   8,   8,   4,   8,   8,   2,   4,
      2,   6,   8,   6,  10,   6,   8,   6,   2,
      4,  12,  16,  14,  12,  14,  16,  12,   4,
      6,  16,  14,  18,  16,  18,  14,  16,   6,
      8,  24,  18,  24,  20,  24,  18,  24,   8,
     12,  14,  16,  20,  18,  20,  16,  14,  12,
      4,  10,  28,  16,   8,  16,  28,  10,   4,
      4,   8,  16,  12,   4,  12,  16,   8,   4,
];

#[rustfmt::skip]
const ROOK_PSQ: [i16; Square::NUM] = [
     -2,  10,   6,  14,  12,  14,   6,  10,  -2,
      8,   4,   8,  16,   8,  16,   8,   4,   8,
      4,   8,   6,  14,  12,  14,   6,   8,   4,
      6,  10,   8,  14,  14,  14,   8,  10,   6,
     12,  16,  14,  20,  20,  20,  14,  16,  12,
     12,  14,  12,  18,  18,  18,  12,  14,  12,
     12,  18,  16,  22,  22,  22,  16,  18,  12,
     12,  12,  12,  18,  18,  18,  12,  12,  12,
     16,  20,  18,  24,  26,  24,  18,  20,  16,
     14,  14,  12,  18,  16,  18,  12,  14,  14,
];

#[rustfmt::skip]
const CANNON_PSQ: [i16; Square::NUM] = [
      0,   0,   2,   6,   6,   6,   2,   0,   0,
      0,   2,   4,   6,   6,   6,   4,   2,   0,
      4,   0,   8,   6,  10,   6,   8,   0,   4,
      0,   0,   0,   2,   4,   2,   0,   0,   0,
     -2,   0,   4,   2,   6,   2,   4,   0,  -2,
      0,   0,   0,   2,   8,   2,   0,   0,   0,
      0,   0,  -2,   4,  10,   4,  -2,   0,   0,
      2,   2,   0, -10,  -8, -10,   0,   2,   2,
      2,   2,   0,  -4, -14,  -4,   0,   2,   2,
      6,   4,   0, -10, -12, -10,   0,   4,   6,
];

#[rustfmt::skip]
const PAWN_PSQ: [i16; Square::NUM] = [
      0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,   0,   0,   0,   0,   0,   0,   0,
      0,   0,  -2,   0,   4,   0,  -2,   0,   0,
      2,   0,   8,   0,   8,   0,   8,   0,   2,
      6,  12,  18,  18,  20,  18,  18,  12,   6,
     10,  20,  30,  34,  40,  34,  30,  20,  10,
     14,  26,  42,  60,  80,  60,  42,  26,  14,
     18,  36,  56,  80, 120,  80,  56,  36,  18,
      0,   3,   6,   9,  12,   9,   6,   3,   0,
];

const DEFAULT_PSQ: [&[i16; Square::NUM]; PieceType::NUM] = [
    &KING_PSQ,
    &ADVISOR_PSQ,
    &BISHOP_PSQ,
    &KNIGHT_PSQ,
    &ROOK_PSQ,
    &CANNON_PSQ,
    &PAWN_PSQ,
];
