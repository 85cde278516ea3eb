use rxiangqi_core::EngineError;
use thiserror::Error;

/// アダプタ操作のエラー
#[derive(Debug, Error)]
pub enum AdapterError {
    /// 探索中に受け付けない操作が呼ばれた
    #[error("{operation} is not allowed while a search is running")]
    SearchInProgress { operation: &'static str },
    /// 探索スレッドを持たない環境では無制限探索を止める手段がない
    #[error("infinite search requires a background search thread")]
    InfiniteWithoutThreads,
    #[error(transparent)]
    Engine(#[from] EngineError),
}

pub type Result<T> = std::result::Result<T, AdapterError>;
