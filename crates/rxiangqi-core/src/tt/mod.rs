//! 置換表モジュール
//!
//! 探索結果をキャッシュする置換表（Transposition Table）。
//!
//! - `TTData`: 読み出したエントリの内容
//! - `TranspositionTable`: テーブル本体（lock-free、複数スレッドから共有）
//! - 世代管理と hashfull

mod entry;
mod table;

pub use entry::{Bound, TTData};
pub use table::{CLUSTER_SIZE, TranspositionTable};
