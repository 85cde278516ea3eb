//! アダプタが駆動するエンジンのインターフェース

use rxiangqi_core::{BestMoveCallback, Engine, EngineError, LimitsType, UpdateCallback};

/// 非同期探索エンジン
///
/// `go` はすぐに戻り、探索ごとに最終結果の通知がちょうど1回届く。
pub trait SearchEngine: Send {
    fn load_networks(&mut self) -> Result<(), EngineError>;
    fn verify_networks(&self) -> Result<(), EngineError>;

    fn set_position(&mut self, fen: &str, moves: &[String]) -> Result<(), EngineError>;
    fn go(&mut self, limits: LimitsType) -> Result<(), EngineError>;
    /// `go` が呼び出し元をブロックせずに戻るか
    fn searches_in_background(&self) -> bool;
    /// 停止要求（終了を待たない）
    fn stop(&self);
    fn wait_for_search_finished(&self);

    fn fen(&self) -> String;
    fn visualize(&self) -> String;

    fn get_hashfull(&self) -> u32;
    fn search_clear(&mut self);
    fn set_tt_size(&mut self, mb: usize) -> Result<(), EngineError>;
    fn resize_threads(&mut self);

    fn perft(&mut self, fen: &str, depth: u32) -> Result<u64, EngineError>;

    fn has_option(&self, name: &str) -> bool;
    fn set_option(&mut self, name: &str, value: &str) -> Result<(), EngineError>;
    /// `option name ... type ...` 形式の一覧
    fn options_text(&self) -> String;

    fn set_on_bestmove(&self, cb: Option<BestMoveCallback>);
    fn set_on_update_full(&self, cb: Option<UpdateCallback>);
}

impl SearchEngine for Engine {
    fn load_networks(&mut self) -> Result<(), EngineError> {
        Engine::load_networks(self)
    }

    fn verify_networks(&self) -> Result<(), EngineError> {
        Engine::verify_networks(self)
    }

    fn set_position(&mut self, fen: &str, moves: &[String]) -> Result<(), EngineError> {
        Engine::set_position(self, fen, moves)
    }

    fn go(&mut self, limits: LimitsType) -> Result<(), EngineError> {
        Engine::go(self, limits)
    }

    fn searches_in_background(&self) -> bool {
        Engine::searches_in_background(self)
    }

    fn stop(&self) {
        Engine::stop(self);
    }

    fn wait_for_search_finished(&self) {
        Engine::wait_for_search_finished(self);
    }

    fn fen(&self) -> String {
        Engine::fen(self)
    }

    fn visualize(&self) -> String {
        Engine::visualize(self)
    }

    fn get_hashfull(&self) -> u32 {
        Engine::get_hashfull(self)
    }

    fn search_clear(&mut self) {
        Engine::search_clear(self);
    }

    fn set_tt_size(&mut self, mb: usize) -> Result<(), EngineError> {
        Engine::set_tt_size(self, mb)
    }

    fn resize_threads(&mut self) {
        Engine::resize_threads(self);
    }

    fn perft(&mut self, fen: &str, depth: u32) -> Result<u64, EngineError> {
        Engine::perft(self, fen, depth)
    }

    fn has_option(&self, name: &str) -> bool {
        Engine::has_option(self, name)
    }

    fn set_option(&mut self, name: &str, value: &str) -> Result<(), EngineError> {
        Engine::set_option(self, name, value)
    }

    fn options_text(&self) -> String {
        self.options().to_string()
    }

    fn set_on_bestmove(&self, cb: Option<BestMoveCallback>) {
        Engine::set_on_bestmove(self, cb);
    }

    fn set_on_update_full(&self, cb: Option<UpdateCallback>) {
        Engine::set_on_update_full(self, cb);
    }
}
