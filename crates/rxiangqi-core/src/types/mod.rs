//! 基本型
//!
//! - `Color`: 手番（紅/黒）
//! - `Square`: 升（9×10）
//! - `PieceType` / `Piece`: 駒種と駒
//! - `Move`: 指し手
//! - `Value`: 評価値

mod color;
mod moves;
mod piece;
mod square;
mod value;

pub use color::Color;
pub use moves::Move;
pub use piece::{Piece, PieceType};
pub use square::Square;
pub use value::Value;

/// 探索深さ
pub type Depth = i32;

/// 最大探索手数
pub const MAX_PLY: i32 = 128;

/// 1局面の最大合法手数（象棋の理論上限は 111 程度）
pub const MAX_MOVES: usize = 128;
