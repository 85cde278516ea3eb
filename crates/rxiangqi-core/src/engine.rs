//! エンジン本体
//!
//! 局面・オプション・置換表・スレッドプールを束ね、非同期の `go` を提供する。
//!
//! - `go` は探索を専用のコーディネータスレッドで開始してすぐに戻る
//! - 反復ごとに `set_on_update_full` のコールバック、終了時に `set_on_bestmove` のコールバックを1回呼ぶ
//! - 局面・オプション・置換表を変更する操作は、実行中の探索の終了を待ってから行う
//! - スレッドを使えない wasm32（atomics なし）では、探索は `go` の呼び出し内で完了する
//! - 探索やコールバックがパニックしても bestmove 通知と終了通知は必ず行う

use std::cell::Cell;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;

use log::{debug, error, info, warn};
use parking_lot::{Condvar, Mutex, RwLock};
use thiserror::Error;

use crate::eval::{DEFAULT_EVAL_FILE, EvalNetwork};
use crate::movegen;
use crate::options::{MAX_HASH_MB, OptionError, OptionsMap, names};
use crate::position::{FenError, Position};
use crate::search::{
    InfoFull, LimitsType, SEARCH_STACK_SIZE, SearchShared, StopSignal, ThreadPool, TimeManagement,
    parallel_supported,
};
use crate::tt::TranspositionTable;

/// `bestmove` 通知（最善手, 予想応手）
pub type BestMoveCallback = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// 反復ごとの探索情報通知
pub type UpdateCallback = Arc<dyn Fn(&InfoFull) + Send + Sync>;

/// エンジン操作のエラー
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to load evaluation network: {0}")]
    NetworkLoad(String),
    #[error("evaluation network '{active}' does not match EvalFile '{expected}'")]
    NetworkMismatch { expected: String, active: String },
    #[error("invalid position: {0}")]
    Position(#[from] FenError),
    #[error("invalid option: {0}")]
    Option(#[from] OptionError),
    #[error("failed to allocate a {mb}MB transposition table")]
    HashAllocation { mb: usize },
    #[error("failed to spawn search thread: {0}")]
    ThreadSpawn(String),
}

thread_local! {
    /// 現在のスレッドが探索コーディネータか（コールバック内からの再入を検出する）
    static IN_SEARCH_THREAD: Cell<bool> = const { Cell::new(false) };
}

/// コーディネータスレッドと共有する状態
struct EngineShared {
    stop: StopSignal,
    nodes: AtomicU64,
    on_bestmove: RwLock<Option<BestMoveCallback>>,
    on_update: RwLock<Option<UpdateCallback>>,
    /// 実行中（bestmove 通知が戻っていない）探索の数
    active: Mutex<usize>,
    finished: Condvar,
}

impl EngineShared {
    fn wait_for_search_finished(&self) {
        if IN_SEARCH_THREAD.with(Cell::get) {
            return;
        }
        let mut active = self.active.lock();
        while *active > 0 {
            self.finished.wait(&mut active);
        }
    }

    fn notify_update(&self, info: &InfoFull) {
        let cb = self.on_update.read().clone();
        if let Some(cb) = cb {
            if catch_unwind(AssertUnwindSafe(|| cb(info))).is_err() {
                warn!("update callback panicked at depth {}", info.depth);
            }
        }
    }

    fn notify_bestmove(&self, best: &str, ponder: &str) {
        let cb = self.on_bestmove.read().clone();
        if let Some(cb) = cb {
            if catch_unwind(AssertUnwindSafe(|| cb(best, ponder))).is_err() {
                warn!("bestmove callback panicked");
            }
        }
    }

    fn finish(&self) {
        let mut active = self.active.lock();
        *active = active.saturating_sub(1);
        self.finished.notify_all();
    }
}

/// コーディネータを抜けるときに終了を通知する
struct FinishGuard<'a>(&'a EngineShared);

impl Drop for FinishGuard<'_> {
    fn drop(&mut self) {
        IN_SEARCH_THREAD.with(|f| f.set(false));
        self.0.finish();
    }
}

/// 1回の探索に必要なもの（コーディネータスレッドへ移す）
struct SearchTask {
    pos: Position,
    limits: LimitsType,
    tt: Arc<TranspositionTable>,
    net: Arc<EvalNetwork>,
    pool: Arc<Mutex<ThreadPool>>,
    move_overhead: i64,
}

impl SearchTask {
    fn run(self, shared: &EngineShared) {
        IN_SEARCH_THREAD.with(|f| f.set(true));
        let _finish = FinishGuard(shared);
        let time = TimeManagement::init(&self.limits, self.pos.side_to_move(), self.move_overhead);
        let search = SearchShared {
            tt: &self.tt,
            net: &self.net,
            stop: &shared.stop,
            limits: &self.limits,
            time: &time,
            nodes: &shared.nodes,
        };
        let report = |info: &InfoFull| shared.notify_update(info);

        let result = catch_unwind(AssertUnwindSafe(|| {
            let mut pool = self.pool.lock();
            pool.start_thinking(&self.pos, &search, &report)
        }));
        let (best, ponder) = match result {
            Ok(result) => {
                let best = result.best_move_str();
                let ponder = result.ponder_move_str();
                debug!(
                    "search finished: bestmove {best} ponder {ponder} depth {} nodes {} time {}ms",
                    result.depth,
                    shared.nodes.load(Ordering::Relaxed),
                    self.limits.elapsed()
                );
                (best, ponder)
            }
            Err(_) => {
                error!("search panicked on {}", self.pos.fen());
                ("(none)".to_string(), String::new())
            }
        };

        shared.notify_bestmove(&best, &ponder);
    }
}

/// 象棋エンジン
pub struct Engine {
    shared: Arc<EngineShared>,
    pool: Arc<Mutex<ThreadPool>>,
    tt: Arc<TranspositionTable>,
    net: Arc<EvalNetwork>,
    position: Position,
    options: OptionsMap,
    /// 評価ファイルなどを探すディレクトリ（None ならカレントディレクトリ）
    root_dir: Option<PathBuf>,
    handles: Vec<JoinHandle<()>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(None)
    }
}

impl Engine {
    /// エンジンを作成（`root_dir` は評価ファイルの探索先）
    pub fn new(root_dir: Option<PathBuf>) -> Self {
        let options = OptionsMap::new();
        let threads = options.get_i64(names::THREADS).unwrap_or(1) as usize;
        let hash = options.get_i64(names::HASH).unwrap_or(16) as usize;
        Self {
            shared: Arc::new(EngineShared {
                stop: StopSignal::new(),
                nodes: AtomicU64::new(0),
                on_bestmove: RwLock::new(None),
                on_update: RwLock::new(None),
                active: Mutex::new(0),
                finished: Condvar::new(),
            }),
            pool: Arc::new(Mutex::new(ThreadPool::new(threads))),
            tt: Arc::new(TranspositionTable::new(hash)),
            net: Arc::new(EvalNetwork::embedded()),
            position: Position::new(),
            options,
            root_dir,
            handles: Vec::new(),
        }
    }

    // =========================================================================
    // 評価ネットワーク
    // =========================================================================

    /// `EvalFile` で指定された評価ファイルを読み込む
    ///
    /// 既定名のファイルが存在しない場合は組み込みネットワークを使う。
    /// 読み込みに失敗した場合、現在のネットワークはそのまま残る。
    pub fn load_networks(&mut self) -> Result<(), EngineError> {
        self.wait_for_search_finished();
        let name = self
            .options
            .get(names::EVAL_FILE)
            .unwrap_or(DEFAULT_EVAL_FILE)
            .to_string();
        let path = self.resource_path(&name);

        let net = if name == DEFAULT_EVAL_FILE && !path.exists() {
            EvalNetwork::embedded()
        } else {
            EvalNetwork::load(&path).map_err(|e| EngineError::NetworkLoad(format!("{e:#}")))?
        };
        info!("evaluation network '{}' loaded", net.name());
        self.net = Arc::new(net);
        Ok(())
    }

    /// 有効なネットワークが `EvalFile` と一致するか検証する
    pub fn verify_networks(&self) -> Result<(), EngineError> {
        let expected = self.options.get(names::EVAL_FILE).unwrap_or(DEFAULT_EVAL_FILE);
        if self.net.name() != expected {
            return Err(EngineError::NetworkMismatch {
                expected: expected.to_string(),
                active: self.net.name().to_string(),
            });
        }
        Ok(())
    }

    /// 有効なネットワーク名
    pub fn network_name(&self) -> &str {
        self.net.name()
    }

    fn resource_path(&self, name: &str) -> PathBuf {
        match &self.root_dir {
            Some(dir) => dir.join(name),
            None => Path::new(name).to_path_buf(),
        }
    }

    // =========================================================================
    // 局面
    // =========================================================================

    /// 局面を設定（失敗した場合は現在の局面を保つ）
    pub fn set_position<S: AsRef<str>>(&mut self, fen: &str, moves: &[S]) -> Result<(), EngineError> {
        self.wait_for_search_finished();
        let mut pos = Position::new();
        pos.set_fen(fen)?;
        pos.apply_uci_moves(moves)?;
        self.position = pos;
        Ok(())
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn fen(&self) -> String {
        self.position.fen()
    }

    pub fn visualize(&self) -> String {
        self.position.visualize()
    }

    // =========================================================================
    // 探索
    // =========================================================================

    /// 探索を開始する
    ///
    /// 実行中の探索があれば終了を待つ。`Hash` / `Threads` オプションの変更はここで反映される。
    pub fn go(&mut self, mut limits: LimitsType) -> Result<(), EngineError> {
        self.wait_for_search_finished();
        self.reap_threads();
        self.apply_pending_settings();

        limits.set_start_time();
        self.shared.stop.reset();
        *self.shared.active.lock() += 1;

        let task = SearchTask {
            pos: self.position.clone(),
            limits,
            tt: Arc::clone(&self.tt),
            net: Arc::clone(&self.net),
            pool: Arc::clone(&self.pool),
            move_overhead: self.options.get_i64(names::MOVE_OVERHEAD).unwrap_or(10),
        };
        debug!("go: {:?} on {}", task.limits, task.pos.fen());

        if !parallel_supported() {
            task.run(&self.shared);
            return Ok(());
        }

        let shared = Arc::clone(&self.shared);
        let spawned = std::thread::Builder::new()
            .name("rxiangqi-search".to_string())
            .stack_size(SEARCH_STACK_SIZE)
            .spawn(move || task.run(&shared));
        match spawned {
            Ok(handle) => {
                self.handles.push(handle);
                Ok(())
            }
            Err(e) => {
                self.shared.finish();
                Err(EngineError::ThreadSpawn(e.to_string()))
            }
        }
    }

    /// 探索の停止を要求する（終了を待たない）
    pub fn stop(&self) {
        self.shared.stop.request();
    }

    /// 実行中の探索が終わり、bestmove 通知が戻るまで待つ
    ///
    /// コールバック内（探索スレッド）から呼ばれた場合は待たずに戻る。
    pub fn wait_for_search_finished(&self) {
        self.shared.wait_for_search_finished();
    }

    /// `go` が探索を別スレッドで走らせ、すぐに戻るか
    ///
    /// false の環境では `go` は探索が終わるまで戻らず、無制限探索は止められない。
    pub fn searches_in_background(&self) -> bool {
        parallel_supported()
    }

    /// 探索中か
    pub fn is_searching(&self) -> bool {
        *self.shared.active.lock() > 0
    }

    fn reap_threads(&mut self) {
        let current = std::thread::current().id();
        for handle in self.handles.drain(..) {
            // コールバック内から go した場合、自身のスレッドは join できない
            if handle.thread().id() == current {
                continue;
            }
            if handle.join().is_err() {
                warn!("search thread panicked");
            }
        }
    }

    fn apply_pending_settings(&mut self) {
        let threads = self.options.get_i64(names::THREADS).unwrap_or(1) as usize;
        {
            let mut pool = self.pool.lock();
            if pool.len() != threads {
                pool.set_num_threads(threads);
            }
        }
        let hash = self.options.get_i64(names::HASH).unwrap_or(16) as usize;
        if self.tt.size_mb() != hash {
            if let Err(e) = self.set_tt_size(hash) {
                warn!("{e}");
            }
        }
    }

    // =========================================================================
    // 置換表・スレッド
    // =========================================================================

    /// 置換表使用率（1000分率）
    pub fn get_hashfull(&self) -> u32 {
        self.tt.hashfull()
    }

    /// 置換表と探索統計をクリアする
    pub fn search_clear(&mut self) {
        self.wait_for_search_finished();
        self.tt.clear();
        self.pool.lock().clear();
        debug!("search state cleared");
    }

    /// 置換表サイズを変更する（MB）
    ///
    /// 確保に失敗した場合は現在の置換表を保つ。`Hash` オプションも確保したサイズに揃える。
    pub fn set_tt_size(&mut self, mb: usize) -> Result<(), EngineError> {
        self.wait_for_search_finished();
        let mb = mb.clamp(1, MAX_HASH_MB as usize);
        if self.tt.size_mb() != mb {
            let tt = TranspositionTable::try_new(mb).ok_or(EngineError::HashAllocation { mb })?;
            self.tt = Arc::new(tt);
            info!("transposition table resized to {mb}MB");
        }
        self.options.set(names::HASH, &mb.to_string())?;
        Ok(())
    }

    /// `Threads` オプションに合わせてスレッドプールを作り直す
    pub fn resize_threads(&mut self) {
        self.wait_for_search_finished();
        let threads = self.options.get_i64(names::THREADS).unwrap_or(1) as usize;
        self.pool.lock().set_num_threads(threads);
        info!("using {threads} search threads");
    }

    /// 探索スレッド数（探索中は終了まで待つ）
    pub fn thread_count(&self) -> usize {
        self.pool.lock().len()
    }

    // =========================================================================
    // オプション
    // =========================================================================

    pub fn options(&self) -> &OptionsMap {
        &self.options
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.options.contains(name)
    }

    /// オプションに値を設定する
    ///
    /// 値は保存されるだけで、`Hash` / `Threads` は次の `go` で反映される。
    /// `Clear Hash` は即座に置換表をクリアする。
    pub fn set_option(&mut self, name: &str, value: &str) -> Result<(), EngineError> {
        self.options.set(name, value)?;
        info!("option '{name}' set to '{value}'");
        if name.eq_ignore_ascii_case(names::CLEAR_HASH) {
            self.search_clear();
        }
        Ok(())
    }

    // =========================================================================
    // コールバック
    // =========================================================================

    pub fn set_on_bestmove(&self, cb: Option<BestMoveCallback>) {
        *self.shared.on_bestmove.write() = cb;
    }

    pub fn set_on_update_full(&self, cb: Option<UpdateCallback>) {
        *self.shared.on_update.write() = cb;
    }

    // =========================================================================
    // perft
    // =========================================================================

    /// 指定局面の perft（現在の局面は変更しない）
    pub fn perft(&mut self, fen: &str, depth: u32) -> Result<u64, EngineError> {
        self.wait_for_search_finished();
        let mut pos = Position::new();
        pos.set_fen(fen)?;
        let nodes = movegen::perft(&mut pos, depth);
        debug!("perft depth {depth}: {nodes}");
        Ok(nodes)
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        self.stop();
        self.wait_for_search_finished();
        self.reap_threads();
    }
}
