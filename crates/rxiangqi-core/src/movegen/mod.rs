//! 指し手生成
//!
//! 疑似合法手を生成し、自玉が取られる形（将帥対面を含む）を後段で除く。

mod generator;
mod perft;

pub use generator::{
    GenType, MoveList, generate_legal, generate_pseudo_legal, is_legal, is_pseudo_legal,
};
pub(crate) use generator::is_legal_pseudo;
pub use perft::{perft, perft_divide};
