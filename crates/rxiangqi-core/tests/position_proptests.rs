//! ランダムな棋譜での局面の整合性

use proptest::prelude::*;
use rand::Rng;
use rand_xoshiro::Xoshiro256StarStar;
use rand_xoshiro::rand_core::SeedableRng;
use rxiangqi_core::movegen::generate_legal;
use rxiangqi_core::{Position, START_FEN};

proptest! {
    #![proptest_config(ProptestConfig { cases: 32, .. ProptestConfig::default() })]

    #[test]
    fn prop_random_playout_keeps_key_and_fen(seed in any::<u64>(), plies in 1usize..80) {
        let mut rng = Xoshiro256StarStar::seed_from_u64(seed);
        let mut pos = Position::new();
        pos.set_fen(START_FEN).unwrap();

        let mut fens = vec![pos.fen()];
        let mut played = 0;
        for _ in 0..plies {
            let moves = generate_legal(&mut pos);
            if moves.is_empty() {
                break;
            }
            let mv = moves[rng.random_range(0..moves.len())];
            pos.do_move(mv);
            played += 1;
            prop_assert_eq!(pos.key(), pos.compute_key());
            prop_assert!(!pos.is_king_attacked(!pos.side_to_move()));

            // FEN 往復で同じ局面になる
            let fen = pos.fen();
            let mut reparsed = Position::new();
            reparsed.set_fen(&fen).unwrap();
            prop_assert_eq!(reparsed.key(), pos.key());
            fens.push(fen);
        }

        for _ in 0..played {
            fens.pop();
            pos.undo_move();
            prop_assert_eq!(Some(&pos.fen()), fens.last());
            prop_assert_eq!(pos.key(), pos.compute_key());
        }
        prop_assert_eq!(pos.fen(), START_FEN);
    }
}
