//! 評価関数
//!
//! 駒割りと駒位置表の合計を手番側から見た値で返す。

mod network;

pub use network::{DEFAULT_EVAL_FILE, EvalNetwork, FILE_SIZE};

use crate::position::Position;
use crate::types::{Color, Square, Value};

/// 手番側から見た評価値
pub fn evaluate(pos: &Position, net: &EvalNetwork) -> Value {
    let mut score = [0i32; Color::NUM];
    for sq in Square::all() {
        if let Some(pc) = pos.piece_on(sq) {
            score[pc.color.index()] +=
                net.material(pc.piece_type) + net.psq(pc.piece_type, sq.relative(pc.color));
        }
    }
    let us = pos.side_to_move();
    Value::new(score[us.index()] - score[(!us).index()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Move;

    #[test]
    fn test_startpos_is_balanced() {
        let pos = Position::new();
        assert_eq!(evaluate(&pos, &EvalNetwork::embedded()), Value::ZERO);
    }

    #[test]
    fn test_evaluate_is_side_relative() {
        let net = EvalNetwork::embedded();
        let mut pos = Position::new();
        // 炮で馬を取ると紅が得をする
        pos.do_move(Move::from_uci("h2h9").unwrap());
        let black_view = evaluate(&pos, &net);
        assert!(black_view.raw() < 0);
        let mut red = pos.clone();
        red.do_null_move();
        assert_eq!(evaluate(&red, &net), -black_view);
    }
}
