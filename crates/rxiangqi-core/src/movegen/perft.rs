//! perft（合法手の葉ノード数）

use super::{GenType, MoveList, generate_pseudo_legal, is_legal_pseudo};
use crate::position::Position;

/// 深さ `depth` の葉ノード数を数える（`depth == 0` は 1）
pub fn perft(pos: &mut Position, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut list = MoveList::new();
    generate_pseudo_legal(pos, GenType::All, &mut list);

    let mut nodes = 0;
    for &mv in list.iter() {
        if !is_legal_pseudo(pos, mv) {
            continue;
        }
        if depth == 1 {
            nodes += 1;
            continue;
        }
        pos.do_move(mv);
        nodes += perft(pos, depth - 1);
        pos.undo_move();
    }
    nodes
}

/// ルートの手ごとの内訳（デバッグ用）
pub fn perft_divide(pos: &mut Position, depth: u32) -> Vec<(String, u64)> {
    if depth == 0 {
        return Vec::new();
    }
    super::generate_legal(pos)
        .into_iter()
        .map(|mv| {
            pos.do_move(mv);
            let n = perft(pos, depth - 1);
            pos.undo_move();
            (mv.to_uci(), n)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_perft_startpos_shallow() {
        let mut pos = Position::new();
        assert_eq!(perft(&mut pos, 0), 1);
        assert_eq!(perft(&mut pos, 1), 44);
        assert_eq!(perft(&mut pos, 2), 1920);
    }

    #[test]
    fn test_divide_sums_to_perft() {
        let mut pos = Position::new();
        let divide = perft_divide(&mut pos, 2);
        assert_eq!(divide.len(), 44);
        assert_eq!(divide.iter().map(|(_, n)| n).sum::<u64>(), 1920);
    }
}
