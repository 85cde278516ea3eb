//! MovePicker（指し手オーダリング）
//!
//! 生成した手に点数を付け、選択ソートで1手ずつ返す。
//!
//! 1. 置換表の指し手
//! 2. 駒を取る手（MVV-LVA）
//! 3. キラー手
//! 4. 静かな手（History 順）

use smallvec::SmallVec;

use crate::movegen::{GenType, MoveList, generate_pseudo_legal};
use crate::position::Position;
use crate::types::{MAX_MOVES, Move, Piece, PieceType, Square};

// =============================================================================
// History
// =============================================================================

/// History の値の上限
const HISTORY_MAX: i32 = 16384;

/// 静かな手の成功/失敗を記録する [piece][to] -> score
pub struct ButterflyHistory {
    table: Box<[[i32; Square::NUM]; Piece::NUM]>,
}

impl Default for ButterflyHistory {
    fn default() -> Self {
        Self {
            table: Box::new([[0; Square::NUM]; Piece::NUM]),
        }
    }
}

impl ButterflyHistory {
    #[inline]
    pub fn get(&self, pc: Piece, to: Square) -> i32 {
        self.table[pc.index()][to.index()]
    }

    /// 値を更新（上限に近いほど変化を小さくする）
    pub fn update(&mut self, pc: Piece, to: Square, bonus: i32) {
        let bonus = bonus.clamp(-HISTORY_MAX, HISTORY_MAX);
        let entry = &mut self.table[pc.index()][to.index()];
        *entry += bonus - *entry * bonus.abs() / HISTORY_MAX;
    }

    pub fn clear(&mut self) {
        for row in self.table.iter_mut() {
            row.fill(0);
        }
    }
}

/// 深さに応じた History ボーナス
#[inline]
pub(crate) fn stat_bonus(depth: i32) -> i32 {
    (depth * depth * 16).min(1600)
}

// =============================================================================
// MovePicker
// =============================================================================

const TT_MOVE_SCORE: i32 = 1_000_000;
const CAPTURE_SCORE: i32 = 500_000;
const KILLER_SCORE: [i32; 2] = [400_000, 399_000];

/// MVV（取られる駒の価値）の順位
const fn victim_rank(pt: PieceType) -> i32 {
    match pt {
        PieceType::King => 10,
        PieceType::Rook => 8,
        PieceType::Cannon | PieceType::Knight => 5,
        PieceType::Advisor | PieceType::Bishop => 3,
        PieceType::Pawn => 2,
    }
}

#[derive(Clone, Copy)]
struct ScoredMove {
    mv: Move,
    score: i32,
}

pub(crate) struct MovePicker {
    moves: SmallVec<[ScoredMove; MAX_MOVES]>,
    index: usize,
}

impl MovePicker {
    pub(crate) fn new(
        pos: &Position,
        gen_type: GenType,
        tt_move: Move,
        killers: [Move; 2],
        history: &ButterflyHistory,
    ) -> Self {
        let mut list = MoveList::new();
        generate_pseudo_legal(pos, gen_type, &mut list);

        let moves = list
            .into_iter()
            .map(|mv| {
                let score = if mv == tt_move {
                    TT_MOVE_SCORE
                } else if let Some(victim) = pos.piece_on(mv.to()) {
                    let attacker = pos.piece_on(mv.from()).map_or(0, |pc| victim_rank(pc.piece_type));
                    CAPTURE_SCORE + victim_rank(victim.piece_type) * 16 - attacker
                } else if mv == killers[0] {
                    KILLER_SCORE[0]
                } else if mv == killers[1] {
                    KILLER_SCORE[1]
                } else {
                    pos.piece_on(mv.from()).map_or(0, |pc| history.get(pc, mv.to()))
                };
                ScoredMove { mv, score }
            })
            .collect();

        Self { moves, index: 0 }
    }
}

impl Iterator for MovePicker {
    type Item = Move;

    fn next(&mut self) -> Option<Move> {
        if self.index >= self.moves.len() {
            return None;
        }
        let rest = &self.moves[self.index..];
        let best = rest
            .iter()
            .enumerate()
            .max_by_key(|(_, m)| m.score)
            .map(|(i, _)| i + self.index)?;
        self.moves.swap(self.index, best);
        self.index += 1;
        Some(self.moves[self.index - 1].mv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;

    #[test]
    fn test_tt_move_first_then_captures() {
        let pos = Position::new();
        let history = ButterflyHistory::default();
        let tt_move = Move::from_uci("b0c2").unwrap();
        let mut picker = MovePicker::new(&pos, GenType::All, tt_move, [Move::NONE; 2], &history);
        assert_eq!(picker.next(), Some(tt_move));
        let second = picker.next().unwrap();
        assert!(pos.is_capture(second));
        let third = picker.next().unwrap();
        assert!(pos.is_capture(third));
        assert_eq!(picker.count(), 41);
    }

    #[test]
    fn test_killer_before_quiet() {
        let pos = Position::new();
        let history = ButterflyHistory::default();
        let killer = Move::from_uci("a3a4").unwrap();
        let picker = MovePicker::new(&pos, GenType::All, Move::NONE, [killer, Move::NONE], &history);
        let order: Vec<Move> = picker.collect();
        assert_eq!(order[2], killer);
    }

    #[test]
    fn test_history_update_is_bounded() {
        let mut history = ButterflyHistory::default();
        let pc = Piece::new(Color::Red, PieceType::Rook);
        let sq = Square::from_coord("a5").unwrap();
        for _ in 0..1000 {
            history.update(pc, sq, stat_bonus(20));
        }
        assert!(history.get(pc, sq) <= HISTORY_MAX);
        history.clear();
        assert_eq!(history.get(pc, sq), 0);
    }
}
