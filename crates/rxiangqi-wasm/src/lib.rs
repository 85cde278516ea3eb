//! # rxiangqi-wasm
//!
//! rxiangqi エンジンをブラウザ（WebAssembly）から使うためのアダプタ。
//!
//! - `limits`: go 系エントリポイントごとの探索制限の組み立て
//! - `bridge`: エンジンからの通知をホストのコールバックへ中継
//! - `engine`: アダプタが駆動するエンジンのインターフェース
//! - `adapter`: 1つのエンジンを所有するセッション
//! - `binding`: `PikafishWASM` 互換の JavaScript バインディング（wasm32 のみ）
//!
//! 探索は非同期で、結果はコールバックで返る。

pub mod adapter;
pub mod bridge;
pub mod engine;
pub mod error;
pub mod limits;

#[cfg(all(target_arch = "wasm32", not(target_feature = "atomics")))]
pub mod binding;

pub use adapter::AdapterInstance;
pub use bridge::{BestMoveSink, CallbackBridge, HostProgressRecord, ProgressRecord, TerminalResult, UpdateSink};
pub use engine::SearchEngine;
pub use error::AdapterError;
pub use limits::LimitsDescriptor;
