//! 駒種（PieceType）と駒（Piece）

use super::Color;

/// 駒種
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum PieceType {
    /// 帥/将
    King = 0,
    /// 仕/士
    Advisor = 1,
    /// 相/象
    Bishop = 2,
    /// 馬
    Knight = 3,
    /// 車
    Rook = 4,
    /// 炮/砲
    Cannon = 5,
    /// 兵/卒
    Pawn = 6,
}

impl PieceType {
    /// 駒種の数
    pub const NUM: usize = 7;

    /// 全ての駒種
    pub const ALL: [PieceType; 7] = [
        PieceType::King,
        PieceType::Advisor,
        PieceType::Bishop,
        PieceType::Knight,
        PieceType::Rook,
        PieceType::Cannon,
        PieceType::Pawn,
    ];

    /// インデックス
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// FEN文字（大文字）
    pub const fn fen_char(self) -> char {
        match self {
            PieceType::King => 'K',
            PieceType::Advisor => 'A',
            PieceType::Bishop => 'B',
            PieceType::Knight => 'N',
            PieceType::Rook => 'R',
            PieceType::Cannon => 'C',
            PieceType::Pawn => 'P',
        }
    }

    /// FEN文字から変換（`E`=象、`H`=馬 の別表記も受け付ける）
    pub const fn from_fen_char(c: char) -> Option<PieceType> {
        match c.to_ascii_uppercase() {
            'K' => Some(PieceType::King),
            'A' => Some(PieceType::Advisor),
            'B' | 'E' => Some(PieceType::Bishop),
            'N' | 'H' => Some(PieceType::Knight),
            'R' => Some(PieceType::Rook),
            'C' => Some(PieceType::Cannon),
            'P' => Some(PieceType::Pawn),
            _ => None,
        }
    }
}

/// 駒（手番 + 駒種）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub color: Color,
    pub piece_type: PieceType,
}

impl Piece {
    /// 駒の種類数（手番×駒種）
    pub const NUM: usize = Color::NUM * PieceType::NUM;

    #[inline]
    pub const fn new(color: Color, piece_type: PieceType) -> Piece {
        Piece { color, piece_type }
    }

    /// Zobrist等のテーブル用インデックス
    #[inline]
    pub const fn index(self) -> usize {
        self.color.index() * PieceType::NUM + self.piece_type.index()
    }

    /// FEN文字（紅は大文字、黒は小文字）
    pub const fn fen_char(self) -> char {
        let c = self.piece_type.fen_char();
        match self.color {
            Color::Red => c,
            Color::Black => c.to_ascii_lowercase(),
        }
    }

    /// FEN文字から変換
    pub const fn from_fen_char(c: char) -> Option<Piece> {
        let color = if c.is_ascii_uppercase() {
            Color::Red
        } else {
            Color::Black
        };
        match PieceType::from_fen_char(c) {
            Some(pt) => Some(Piece::new(color, pt)),
            None => None,
        }
    }
}
