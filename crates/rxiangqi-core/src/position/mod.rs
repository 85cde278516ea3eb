//! 局面表現
//!
//! - `Position`: 盤面・手番・Zobristキー・局面履歴
//! - FEN の入出力と座標表記の指し手列の適用
//! - 王手判定（将帥対面を含む）

mod fen;
mod pos;
mod zobrist;

pub use fen::{FenError, START_FEN};
pub use pos::Position;
pub(crate) use pos::{KNIGHT_DELTAS, pawn_forward};
pub use zobrist::{zobrist_psq, zobrist_side};
