//! # rxiangqi-core
//!
//! 象棋（Xiangqi）エンジンのコアライブラリ。
//!
//! ## モジュール構成
//!
//! - `types`: 基本型（Color, Square, Piece, Move, Value）
//! - `position`: 局面表現とdo_move/undo_move、FEN
//! - `movegen`: 合法手生成とperft
//! - `eval`: 評価ネットワーク（駒割り + 駒位置表）
//! - `tt`: 置換表（Transposition Table）
//! - `search`: 探索（反復深化PVS、Lazy SMP）
//! - `options`: エンジンオプション（USI/UCI setoption 相当）
//! - `engine`: 上記を束ねた非同期エンジン
//!

pub mod types;

pub mod position;

pub mod movegen;

pub mod eval;

pub mod tt;

pub mod search;

pub mod options;

pub mod engine;

mod time;

pub use engine::{BestMoveCallback, Engine, EngineError, UpdateCallback};
pub use options::{EngineOption, OptionError, OptionsMap};
pub use position::{FenError, Position, START_FEN};
pub use search::{InfoFull, LimitsType};
pub use types::{Color, Move, Piece, PieceType, Square, Value};
