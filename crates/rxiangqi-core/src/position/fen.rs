//! FEN の入出力
//!
//! 形式: `<盤面> <手番> - - <halfmove> <fullmove>`
//! 盤面は段 9（黒側）から段 0 へ `/` 区切りで並べる。

use thiserror::Error;

use super::Position;
use crate::movegen;
use crate::types::{Color, Move, Piece, PieceType, Square};

/// 平手初期局面
pub const START_FEN: &str = "rnbakabnr/9/1c5c1/p1p1p1p1p/9/9/P1P1P1P1P/1C5C1/9/RNBAKABNR w - - 0 1";

/// FEN・指し手列の解釈エラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FenError {
    #[error("empty FEN string")]
    Empty,
    #[error("expected 10 ranks, found {0}")]
    RankCount(usize),
    #[error("rank {rank} describes {files} files (expected 9)")]
    FileCount { rank: usize, files: usize },
    #[error("invalid piece character '{0}'")]
    InvalidPiece(char),
    #[error("invalid side to move '{0}'")]
    InvalidSideToMove(String),
    #[error("invalid move counter '{0}'")]
    InvalidCounter(String),
    #[error("{0:?} must have exactly one king")]
    KingCount(Color),
    #[error("{0:?} king is outside its palace")]
    KingOutsidePalace(Color),
    #[error("illegal or malformed move '{mv}' at index {index}")]
    IllegalMove { index: usize, mv: String },
}

impl Position {
    /// FEN から局面を設定
    ///
    /// `"startpos"` は初期局面の別名として受け付ける。失敗した場合、局面は変更されない。
    pub fn set_fen(&mut self, fen: &str) -> Result<(), FenError> {
        let fen = fen.trim();
        let fen = if fen == "startpos" { START_FEN } else { fen };
        let mut fields = fen.split_whitespace();
        let board = fields.next().ok_or(FenError::Empty)?;

        let mut pos = Position::empty();
        let ranks: Vec<&str> = board.split('/').collect();
        if ranks.len() != Square::RANK_NUM {
            return Err(FenError::RankCount(ranks.len()));
        }
        for (i, rank_str) in ranks.iter().enumerate() {
            let rank = (Square::RANK_NUM - 1 - i) as i32;
            let mut file = 0usize;
            for c in rank_str.chars() {
                if let Some(d) = c.to_digit(10) {
                    file += d as usize;
                    continue;
                }
                let pc = Piece::from_fen_char(c).ok_or(FenError::InvalidPiece(c))?;
                let sq = Square::new(file as i32, rank).ok_or(FenError::FileCount {
                    rank: rank as usize,
                    files: file + 1,
                })?;
                if pc.piece_type == PieceType::King && pos.king_sq[pc.color.index()].is_some() {
                    return Err(FenError::KingCount(pc.color));
                }
                pos.put_piece(pc, sq);
                file += 1;
            }
            if file != Square::FILE_NUM {
                return Err(FenError::FileCount {
                    rank: rank as usize,
                    files: file,
                });
            }
        }

        for color in Color::ALL {
            match pos.king_sq[color.index()] {
                None => return Err(FenError::KingCount(color)),
                Some(ksq) if !ksq.in_palace(color) => {
                    return Err(FenError::KingOutsidePalace(color));
                }
                Some(_) => {}
            }
        }

        if let Some(side) = fields.next() {
            let mut chars = side.chars();
            pos.side_to_move = match (chars.next().and_then(Color::from_fen_char), chars.next()) {
                (Some(c), None) => c,
                _ => return Err(FenError::InvalidSideToMove(side.to_string())),
            };
        }
        if pos.side_to_move == Color::Black {
            pos.key ^= super::zobrist::zobrist_side();
        }

        // 3・4 番目のフィールドは象棋では未使用
        let _ = fields.next();
        let _ = fields.next();

        if let Some(h) = fields.next() {
            pos.halfmove = h.parse().map_err(|_| FenError::InvalidCounter(h.to_string()))?;
        }
        if let Some(f) = fields.next() {
            pos.fullmove = f
                .parse::<u32>()
                .map_err(|_| FenError::InvalidCounter(f.to_string()))?
                .max(1);
        }

        *self = pos;
        Ok(())
    }

    /// FEN 文字列を生成
    pub fn fen(&self) -> String {
        let mut s = String::with_capacity(96);
        for rank in (0..Square::RANK_NUM as i32).rev() {
            let mut empty = 0;
            for file in 0..Square::FILE_NUM as i32 {
                match Square::new(file, rank).and_then(|sq| self.piece_on(sq)) {
                    Some(pc) => {
                        if empty > 0 {
                            s.push(char::from(b'0' + empty));
                            empty = 0;
                        }
                        s.push(pc.fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                s.push(char::from(b'0' + empty));
            }
            if rank > 0 {
                s.push('/');
            }
        }
        s.push(' ');
        s.push(self.side_to_move.fen_char());
        s.push_str(&format!(" - - {} {}", self.halfmove, self.fullmove));
        s
    }

    /// 座標表記の指し手列を順に適用
    ///
    /// 解釈できない手・非合法手に当たった時点で停止し、それ以前の手は適用済みのまま残る。
    pub fn apply_uci_moves<S: AsRef<str>>(&mut self, moves: &[S]) -> Result<(), FenError> {
        for (index, m) in moves.iter().enumerate() {
            let text = m.as_ref();
            let mv = Move::from_uci(text)
                .filter(|&mv| movegen::is_legal(self, mv))
                .ok_or_else(|| FenError::IllegalMove {
                    index,
                    mv: text.to_string(),
                })?;
            self.do_move(mv);
        }
        Ok(())
    }
}
