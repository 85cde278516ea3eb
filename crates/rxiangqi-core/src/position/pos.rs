//! 局面本体

use std::fmt::Write as _;

use super::zobrist::{zobrist_psq, zobrist_side};
use crate::types::{Color, Move, Piece, PieceType, Square};

/// do_move で積む局面状態
#[derive(Clone, Copy, Debug)]
pub(crate) struct StateInfo {
    /// 指す前の局面のキー
    key: u64,
    /// 取った駒
    captured: Option<Piece>,
    /// 指した手（null move は Move::NONE）
    mv: Move,
    /// 指す前の halfmove clock
    halfmove: u32,
}

/// 局面
///
/// 盤面配列・玉位置・Zobristキーは `put_piece` / `remove_piece` / `do_move` 系を通じて
/// 更新され、常に互いに整合しているように保つ。
#[derive(Clone)]
pub struct Position {
    pub(super) board: [Option<Piece>; Square::NUM],
    pub(super) side_to_move: Color,
    pub(super) king_sq: [Option<Square>; Color::NUM],
    pub(super) key: u64,
    /// 駒を取らない手の連続数
    pub(super) halfmove: u32,
    /// 手数（黒が指すごとに1増える）
    pub(super) fullmove: u32,
    pub(super) states: Vec<StateInfo>,
}

impl Default for Position {
    fn default() -> Self {
        Self::empty()
    }
}

impl Position {
    /// 空の盤面
    pub(crate) fn empty() -> Self {
        Self {
            board: [None; Square::NUM],
            side_to_move: Color::Red,
            king_sq: [None; Color::NUM],
            key: 0,
            halfmove: 0,
            fullmove: 1,
            states: Vec::with_capacity(256),
        }
    }

    /// 平手初期局面
    pub fn new() -> Self {
        let mut pos = Self::empty();
        // START_FEN は常に正しいので失敗しない
        if let Err(e) = pos.set_fen(super::START_FEN) {
            log::error!("failed to set start position: {e}");
        }
        pos
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.side_to_move
    }

    #[inline]
    pub fn key(&self) -> u64 {
        self.key
    }

    #[inline]
    pub fn piece_on(&self, sq: Square) -> Option<Piece> {
        self.board[sq.index()]
    }

    #[inline]
    pub fn king_square(&self, color: Color) -> Option<Square> {
        self.king_sq[color.index()]
    }

    /// ルートからの手数（do_move の深さ）
    #[inline]
    pub fn game_ply(&self) -> usize {
        self.states.len()
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove
    }

    /// 指定手番の駒を列挙
    pub fn pieces(&self, color: Color) -> impl Iterator<Item = (Square, PieceType)> + '_ {
        Square::all().filter_map(move |sq| match self.board[sq.index()] {
            Some(pc) if pc.color == color => Some((sq, pc.piece_type)),
            _ => None,
        })
    }

    pub(super) fn put_piece(&mut self, pc: Piece, sq: Square) {
        debug_assert!(self.board[sq.index()].is_none());
        self.board[sq.index()] = Some(pc);
        self.key ^= zobrist_psq(pc, sq);
        if pc.piece_type == PieceType::King {
            self.king_sq[pc.color.index()] = Some(sq);
        }
    }

    pub(super) fn remove_piece(&mut self, sq: Square) -> Option<Piece> {
        let pc = self.board[sq.index()].take()?;
        self.key ^= zobrist_psq(pc, sq);
        if pc.piece_type == PieceType::King {
            self.king_sq[pc.color.index()] = None;
        }
        Some(pc)
    }

    /// キーを盤面から再計算（整合性チェック用）
    pub fn compute_key(&self) -> u64 {
        let mut key = 0;
        for sq in Square::all() {
            if let Some(pc) = self.board[sq.index()] {
                key ^= zobrist_psq(pc, sq);
            }
        }
        if self.side_to_move == Color::Black {
            key ^= zobrist_side();
        }
        key
    }

    /// 駒を取る手か
    #[inline]
    pub fn is_capture(&self, mv: Move) -> bool {
        self.board[mv.to().index()].is_some()
    }

    /// 直前の手で取られた駒
    pub fn captured_piece(&self) -> Option<Piece> {
        self.states.last().and_then(|st| st.captured)
    }

    /// 手を進める（合法性は呼び出し側で保証する）
    pub fn do_move(&mut self, mv: Move) {
        let from = mv.from();
        let to = mv.to();
        self.states.push(StateInfo {
            key: self.key,
            captured: self.board[to.index()],
            mv,
            halfmove: self.halfmove,
        });

        let captured = self.remove_piece(to);
        if let Some(pc) = self.remove_piece(from) {
            self.put_piece(pc, to);
        }

        self.halfmove = if captured.is_some() {
            0
        } else {
            self.halfmove + 1
        };
        if self.side_to_move == Color::Black {
            self.fullmove += 1;
        }
        self.side_to_move = !self.side_to_move;
        self.key ^= zobrist_side();
    }

    /// 手を戻す
    pub fn undo_move(&mut self) {
        let Some(st) = self.states.pop() else {
            return;
        };
        self.side_to_move = !self.side_to_move;
        if self.side_to_move == Color::Black {
            self.fullmove -= 1;
        }

        if !st.mv.is_none() {
            let from = st.mv.from();
            let to = st.mv.to();
            if let Some(pc) = self.remove_piece(to) {
                self.put_piece(pc, from);
            }
            if let Some(captured) = st.captured {
                self.put_piece(captured, to);
            }
        }
        self.halfmove = st.halfmove;
        self.key = st.key;
    }

    /// パス（null move）
    pub fn do_null_move(&mut self) {
        self.states.push(StateInfo {
            key: self.key,
            captured: None,
            mv: Move::NONE,
            halfmove: self.halfmove,
        });
        // パスを挟んだ繰り返しは検出しない
        self.halfmove = 0;
        if self.side_to_move == Color::Black {
            self.fullmove += 1;
        }
        self.side_to_move = !self.side_to_move;
        self.key ^= zobrist_side();
    }

    pub fn undo_null_move(&mut self) {
        self.undo_move();
    }

    /// 同一局面の繰り返しがあるか
    ///
    /// 駒取りで途切れるまでの範囲で、同じ手番の局面キーを2手おきに遡る。
    /// 象棋の長将・長捉の裁定は行わず、繰り返しは全て引き分けとして扱う。
    pub fn is_repetition(&self) -> bool {
        let reach = (self.halfmove as usize).min(self.states.len());
        let mut i = 2;
        while i <= reach {
            let st = &self.states[self.states.len() - i];
            if st.key == self.key {
                return true;
            }
            i += 2;
        }
        false
    }

    /// 手番側の帥/将が攻撃されているか（王手・将帥対面を含む）
    #[inline]
    pub fn in_check(&self) -> bool {
        self.is_king_attacked(self.side_to_move)
    }

    /// 指定手番の帥/将が攻撃されているか
    pub fn is_king_attacked(&self, color: Color) -> bool {
        match self.king_square(color) {
            Some(ksq) => self.is_attacked(ksq, !color),
            // 玉が取られた局面（探索中は生じない）は王手扱い
            None => true,
        }
    }

    /// `sq` が `by` 側の駒から攻撃されているか
    ///
    /// 仕・相は河を越えず九宮外にも出ないため、玉升への攻撃判定では無視できる。
    pub(crate) fn is_attacked(&self, sq: Square, by: Color) -> bool {
        // 車・将帥対面・炮
        for (df, dr) in [(0, 1), (0, -1), (1, 0), (-1, 0)] {
            let mut cur = sq.offset(df, dr);
            let mut screen = false;
            while let Some(s) = cur {
                if let Some(pc) = self.board[s.index()] {
                    if !screen {
                        if pc.color == by {
                            match pc.piece_type {
                                PieceType::Rook => return true,
                                PieceType::King if df == 0 => return true,
                                _ => {}
                            }
                        }
                        screen = true;
                    } else {
                        if pc.color == by && pc.piece_type == PieceType::Cannon {
                            return true;
                        }
                        break;
                    }
                }
                cur = s.offset(df, dr);
            }
        }

        // 馬（馬脚は馬側から見た直交1歩目）
        for (df, dr) in KNIGHT_DELTAS {
            let Some(n) = sq.offset(df, dr) else {
                continue;
            };
            match self.board[n.index()] {
                Some(pc) if pc.color == by && pc.piece_type == PieceType::Knight => {
                    let leg = if df.abs() == 2 {
                        n.offset(-df / 2, 0)
                    } else {
                        n.offset(0, -dr / 2)
                    };
                    if let Some(leg) = leg {
                        if self.board[leg.index()].is_none() {
                            return true;
                        }
                    }
                }
                _ => {}
            }
        }

        // 兵（前進と、河を越えた後の横移動）
        let forward = pawn_forward(by);
        if let Some(s) = sq.offset(0, -forward) {
            if self.is_pawn_of(s, by) {
                return true;
            }
        }
        for df in [-1, 1] {
            if let Some(s) = sq.offset(df, 0) {
                if self.is_pawn_of(s, by) && s.crossed_river(by) {
                    return true;
                }
            }
        }

        false
    }

    #[inline]
    fn is_pawn_of(&self, sq: Square, color: Color) -> bool {
        matches!(self.board[sq.index()], Some(pc) if pc.color == color && pc.piece_type == PieceType::Pawn)
    }

    /// 盤面をASCIIで表示（デバッグ用）
    pub fn visualize(&self) -> String {
        let mut out = String::new();
        out.push_str("\n +---+---+---+---+---+---+---+---+---+\n");
        for rank in (0..Square::RANK_NUM as i32).rev() {
            for file in 0..Square::FILE_NUM as i32 {
                let c = Square::new(file, rank)
                    .and_then(|sq| self.piece_on(sq))
                    .map(Piece::fen_char)
                    .unwrap_or(' ');
                let _ = write!(out, " | {c}");
            }
            let _ = writeln!(out, " | {rank}");
            out.push_str(" +---+---+---+---+---+---+---+---+---+\n");
        }
        out.push_str("   a   b   c   d   e   f   g   h   i\n\n");
        let _ = writeln!(out, "Fen: {}", self.fen());
        let _ = writeln!(out, "Key: {:016X}", self.key);
        let _ = writeln!(out, "Checked: {}", if self.in_check() { "yes" } else { "no" });
        out
    }
}

/// 馬の移動量（移動先 - 移動元）
pub(crate) const KNIGHT_DELTAS: [(i32, i32); 8] =
    [(1, 2), (-1, 2), (1, -2), (-1, -2), (2, 1), (2, -1), (-2, 1), (-2, -1)];

/// 兵の前進方向（段の増減）
#[inline]
pub(crate) const fn pawn_forward(color: Color) -> i32 {
    match color {
        Color::Red => 1,
        Color::Black => -1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::START_FEN;

    fn sq(s: &str) -> Square {
        Square::from_coord(s).unwrap()
    }

    #[test]
    fn test_do_undo_restores_state() {
        let mut pos = Position::new();
        let key = pos.key();
        pos.do_move(Move::new(sq("h2"), sq("e2")));
        assert_eq!(pos.side_to_move(), Color::Black);
        assert_ne!(pos.key(), key);
        assert_eq!(pos.key(), pos.compute_key());
        pos.undo_move();
        assert_eq!(pos.key(), key);
        assert_eq!(pos.fen(), START_FEN);
    }

    #[test]
    fn test_capture_undo() {
        let mut pos = Position::new();
        // 炮で馬を取る
        let mv = Move::new(sq("h2"), sq("h9"));
        assert!(pos.is_capture(mv));
        pos.do_move(mv);
        assert_eq!(pos.captured_piece().map(|p| p.piece_type), Some(PieceType::Knight));
        assert_eq!(pos.halfmove_clock(), 0);
        pos.undo_move();
        assert_eq!(pos.fen(), START_FEN);
    }

    #[test]
    fn test_flying_general() {
        let mut pos = Position::empty();
        pos.set_fen("4k4/9/9/9/9/9/9/9/9/4K4 w - - 0 1").unwrap();
        assert!(pos.in_check());
        pos.set_fen("4k4/9/9/9/9/9/9/9/4R4/4K4 w - - 0 1").unwrap();
        assert!(!pos.in_check());
    }

    #[test]
    fn test_cannon_and_knight_attacks() {
        let mut pos = Position::empty();
        // 炮の砲台越し
        pos.set_fen("4k4/9/9/9/4P4/9/9/4C4/9/3K5 b - - 0 1").unwrap();
        assert!(pos.in_check());
        // 馬脚が塞がれている
        pos.set_fen("4k4/3p5/3N5/9/9/9/9/9/9/3K5 b - - 0 1").unwrap();
        assert!(!pos.in_check());
        pos.set_fen("4k4/9/3N5/9/9/9/9/9/9/3K5 b - - 0 1").unwrap();
        assert!(pos.in_check());
    }

    #[test]
    fn test_pawn_attacks() {
        let mut pos = Position::empty();
        // 河を越えた兵の横利き
        pos.set_fen("3Pk4/9/9/9/9/9/9/9/9/3K5 b - - 0 1").unwrap();
        assert!(pos.in_check());
        // 卒の前進利き（黒の兵は段が減る方向へ進む）
        pos.set_fen("4k4/9/9/9/9/9/9/9/3p5/3K5 w - - 0 1").unwrap();
        assert!(pos.in_check());
    }

    #[test]
    fn test_repetition() {
        let mut pos = Position::new();
        let moves = ["h2h1", "h7h8", "h1h2", "h8h7"];
        for m in moves {
            pos.do_move(Move::from_uci(m).unwrap());
        }
        assert!(pos.is_repetition());
    }
}
