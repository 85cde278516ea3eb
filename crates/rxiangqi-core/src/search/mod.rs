//! 探索
//!
//! - `LimitsType`: 探索制限（go コマンドのパラメータ）
//! - `TimeManagement`: 思考時間の配分
//! - `InfoFull`: 反復ごとの探索情報
//! - `SearchWorker`: 反復深化 PVS + 静止探索
//! - `ThreadPool`: Lazy SMP
//! - `StopSignal`: 停止要求

mod info;
mod limits;
mod movepicker;
mod stop;
mod thread_pool;
mod time_manager;
mod worker;

pub use info::InfoFull;
pub use limits::{LimitsType, TimePoint};
pub use movepicker::ButterflyHistory;
pub use stop::StopSignal;
pub use thread_pool::{SearchResult, ThreadPool, parallel_supported};
pub use time_manager::TimeManagement;
pub use worker::SearchWorker;

pub(crate) use thread_pool::SEARCH_STACK_SIZE;
pub(crate) use worker::SearchShared;
