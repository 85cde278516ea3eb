//! 初期局面からの perft

use rxiangqi_core::movegen::{perft, perft_divide};
use rxiangqi_core::{Position, START_FEN};

fn start_position() -> Position {
    let mut pos = Position::new();
    pos.set_fen(START_FEN).unwrap();
    pos
}

#[test]
fn test_perft_startpos_shallow() {
    let mut pos = start_position();
    assert_eq!(perft(&mut pos, 0), 1);
    assert_eq!(perft(&mut pos, 1), 44);
    assert_eq!(perft(&mut pos, 2), 1_920);
    assert_eq!(perft(&mut pos, 3), 79_666);
    // 局面は元に戻る
    assert_eq!(pos.fen(), START_FEN);
}

#[test]
#[ignore = "slow in debug builds"]
fn test_perft_startpos_depth4() {
    let mut pos = start_position();
    assert_eq!(perft(&mut pos, 4), 3_290_240);
}

#[test]
fn test_perft_divide_sums_to_total() {
    let mut pos = start_position();
    let divide = perft_divide(&mut pos, 2);
    assert_eq!(divide.len(), 44);
    assert_eq!(divide.iter().map(|(_, n)| n).sum::<u64>(), 1_920);
    assert!(divide.iter().any(|(mv, _)| mv == "h2e2"));
}

#[test]
fn test_perft_no_legal_moves() {
    // 黒将は動けず、王手もされていない（象棋では負け）
    let mut pos = Position::new();
    pos.set_fen("4k4/3R1R3/9/9/9/9/9/9/9/3K5 b - - 0 1").unwrap();
    assert_eq!(perft(&mut pos, 1), 0);
}
