//! 1つのエンジンを所有するセッション
//!
//! ホストのエントリポイントはホストのスレッドで呼ばれ、コールバックはエンジンのスレッドで呼ばれる。
//! 探索中は go 系・局面設定・オプション変更・perft を受け付けない。

use std::sync::Arc;

use log::{debug, info, warn};
use rxiangqi_core::search::TimePoint;
use rxiangqi_core::{Engine, InfoFull};

use crate::bridge::{BestMoveSink, CallbackBridge, UpdateSink};
use crate::engine::SearchEngine;
use crate::error::{AdapterError, Result};
use crate::limits::LimitsDescriptor;

pub struct AdapterInstance<E: SearchEngine = Engine> {
    engine: E,
    bridge: Arc<CallbackBridge>,
}

impl Default for AdapterInstance<Engine> {
    fn default() -> Self {
        Self::new()
    }
}

impl AdapterInstance<Engine> {
    /// 既定のエンジン（リソース位置の指定なし）でセッションを作成
    pub fn new() -> Self {
        Self::with_engine(Engine::new(None))
    }
}

impl<E: SearchEngine> AdapterInstance<E> {
    /// エンジンへトランポリンを登録してセッションを作成
    pub fn with_engine(engine: E) -> Self {
        let bridge = Arc::new(CallbackBridge::new());

        let b = Arc::clone(&bridge);
        engine.set_on_bestmove(Some(Arc::new(move |best: &str, ponder: &str| {
            b.deliver_terminal(best, ponder);
        })));
        let b = Arc::clone(&bridge);
        engine.set_on_update_full(Some(Arc::new(move |info: &InfoFull| {
            b.deliver_update(info);
        })));

        Self { engine, bridge }
    }

    fn ensure_idle(&self, operation: &'static str) -> Result<()> {
        if self.bridge.is_searching() {
            warn!("{operation} rejected: search in progress");
            return Err(AdapterError::SearchInProgress { operation });
        }
        Ok(())
    }

    // =========================================================================
    // 初期化
    // =========================================================================

    /// 評価ネットワークを読み込んで検証する（失敗は握りつぶす）
    pub fn init(&mut self) {
        if let Err(e) = self.try_init() {
            warn!("init failed, keeping the active network: {e}");
        }
    }

    /// 評価ネットワークを読み込んで検証する
    pub fn try_init(&mut self) -> Result<()> {
        self.ensure_idle("init")?;
        self.engine.load_networks()?;
        self.engine.verify_networks()?;
        info!("engine initialized");
        Ok(())
    }

    // =========================================================================
    // 局面
    // =========================================================================

    pub fn set_position(&mut self, fen: &str) -> Result<()> {
        self.set_position_with_moves(fen, &[])
    }

    pub fn set_position_with_moves(&mut self, fen: &str, moves: &[String]) -> Result<()> {
        self.ensure_idle("setPosition")?;
        self.engine.set_position(fen, moves)?;
        Ok(())
    }

    pub fn fen(&self) -> String {
        self.engine.fen()
    }

    pub fn visualize(&self) -> String {
        self.engine.visualize()
    }

    // =========================================================================
    // 探索
    // =========================================================================

    /// 探索を開始してすぐに戻る
    ///
    /// 探索スレッドを持たないエンジンでは、探索はこの呼び出しの中で完了する。
    /// その場合 `stop` を呼ぶ機会がないため、無制限探索は拒否する。
    pub fn go(&mut self, limits: &LimitsDescriptor) -> Result<()> {
        if limits.infinite && !self.engine.searches_in_background() {
            warn!("go rejected: infinite search without a search thread");
            return Err(AdapterError::InfiniteWithoutThreads);
        }
        if !self.bridge.begin_search() {
            warn!("go rejected: search in progress");
            return Err(AdapterError::SearchInProgress { operation: "go" });
        }
        debug!("go {limits:?}");
        if let Err(e) = self.engine.go(limits.into()) {
            self.bridge.cancel_search();
            return Err(e.into());
        }
        Ok(())
    }

    pub fn go_depth(&mut self, depth: i32) -> Result<()> {
        self.go(&LimitsDescriptor::depth(depth))
    }

    /// 両手番の持ち時間を `ms` として探索
    pub fn go_time(&mut self, ms: TimePoint) -> Result<()> {
        self.go(&LimitsDescriptor::time(ms))
    }

    pub fn go_nodes(&mut self, nodes: u64) -> Result<()> {
        self.go(&LimitsDescriptor::nodes(nodes))
    }

    pub fn go_infinite(&mut self) -> Result<()> {
        self.go(&LimitsDescriptor::infinite())
    }

    pub fn go_move_time(&mut self, ms: TimePoint) -> Result<()> {
        self.go(&LimitsDescriptor::movetime(ms))
    }

    /// 停止要求（探索していなければ何もしない）
    pub fn stop(&self) {
        if self.bridge.is_searching() {
            self.engine.stop();
        }
    }

    pub fn wait_for_search_finished(&self) {
        self.engine.wait_for_search_finished();
    }

    pub fn is_searching(&self) -> bool {
        self.bridge.is_searching()
    }

    /// 直近に完了した探索の最善手（未探索なら空文字列）
    pub fn best_move(&self) -> String {
        self.bridge.last_result().best_move
    }

    /// 直近に完了した探索の予想応手（無ければ空文字列）
    pub fn ponder_move(&self) -> String {
        self.bridge.last_result().ponder_move
    }

    pub fn perft(&mut self, fen: &str, depth: u32) -> Result<u64> {
        self.ensure_idle("perft")?;
        Ok(self.engine.perft(fen, depth)?)
    }

    // =========================================================================
    // オプション
    // =========================================================================

    /// エンジンが公開しているオプションにだけ値を設定する（未知の名前は無視）
    pub fn set_option(&mut self, name: &str, value: &str) -> Result<()> {
        self.ensure_idle("setOption")?;
        if !self.engine.has_option(name) {
            debug!("ignoring unknown option '{name}'");
            return Ok(());
        }
        self.engine.set_option(name, value)?;
        Ok(())
    }

    pub fn options_text(&self) -> String {
        self.engine.options_text()
    }

    pub fn set_hash_size(&mut self, mb: usize) -> Result<()> {
        self.ensure_idle("setHashSize")?;
        self.engine.set_tt_size(mb)?;
        Ok(())
    }

    pub fn clear_hash(&mut self) -> Result<()> {
        self.ensure_idle("clearHash")?;
        self.engine.search_clear();
        Ok(())
    }

    /// スレッド数を設定してワーカーを作り直す
    pub fn set_threads(&mut self, threads: usize) -> Result<()> {
        self.ensure_idle("setThreads")?;
        self.engine.set_option("Threads", &threads.to_string())?;
        self.engine.resize_threads();
        Ok(())
    }

    /// 置換表使用率（1000分率）
    pub fn hash_full(&self) -> u32 {
        self.engine.get_hashfull()
    }

    // =========================================================================
    // コールバック
    // =========================================================================

    /// `None` で通知を止める
    pub fn set_on_update(&self, sink: Option<UpdateSink>) {
        self.bridge.set_on_update(sink);
    }

    pub fn set_on_bestmove(&self, sink: Option<BestMoveSink>) {
        self.bridge.set_on_bestmove(sink);
    }
}

impl<E: SearchEngine> Drop for AdapterInstance<E> {
    fn drop(&mut self) {
        if self.bridge.is_searching() {
            self.engine.stop();
            self.engine.wait_for_search_finished();
        }
    }
}
