//! エンジンからの通知をホストのコールバックへ中継する
//!
//! - 探索情報は `ProgressRecord` に詰め替えて `onUpdate` へ渡す
//! - 最終結果はキャッシュへ書き、探索中フラグを下ろしてから `onBestMove` を呼ぶ
//!
//! コールバックは `RwLock` から複製して取り出し、ロックを持たずに呼ぶ。
//! 差し替えはいつでもよく、取り出し済みの通知は差し替え前の受け手へ届く。

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::debug;
use parking_lot::{Mutex, RwLock};
use rxiangqi_core::InfoFull;
use serde::Serialize;

/// 探索情報の受け手
pub type UpdateSink = Arc<dyn Fn(&ProgressRecord) + Send + Sync>;

/// 最終結果（最善手, 予想応手）の受け手
pub type BestMoveSink = Arc<dyn Fn(&str, &str) + Send + Sync>;

/// 反復ごとの探索情報
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProgressRecord {
    pub depth: i32,
    pub seldepth: i32,
    /// 経過時間（ms）
    pub time: u64,
    pub nodes: u64,
    pub score: i32,
    /// 置換表使用率（1000分率）
    pub hashfull: u32,
    pub nps: u64,
    pub tbhits: u64,
}

impl From<&InfoFull> for ProgressRecord {
    fn from(info: &InfoFull) -> Self {
        Self {
            depth: info.depth,
            seldepth: info.sel_depth,
            time: info.time_ms,
            nodes: info.nodes,
            score: info.score.raw(),
            hashfull: info.hashfull,
            nps: info.nps,
            tbhits: info.tb_hits,
        }
    }
}

/// JavaScript の number しか持たないホスト向けの表現
///
/// 64bit のカウンタは f64 へ広げる（2^53 までは正確）。
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HostProgressRecord {
    pub depth: i32,
    pub seldepth: i32,
    pub time: f64,
    pub nodes: f64,
    pub score: i32,
    pub hashfull: u32,
    pub nps: f64,
    pub tbhits: f64,
}

impl From<&ProgressRecord> for HostProgressRecord {
    fn from(rec: &ProgressRecord) -> Self {
        Self {
            depth: rec.depth,
            seldepth: rec.seldepth,
            time: rec.time as f64,
            nodes: rec.nodes as f64,
            score: rec.score,
            hashfull: rec.hashfull,
            nps: rec.nps as f64,
            tbhits: rec.tbhits as f64,
        }
    }
}

/// 直近に完了した探索の結果
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalResult {
    pub best_move: String,
    pub ponder_move: String,
}

/// コールバックの差し替え口と、探索状態・結果キャッシュ
///
/// アダプタとエンジン側のトランポリンで共有する。
#[derive(Default)]
pub struct CallbackBridge {
    on_update: RwLock<Option<UpdateSink>>,
    on_bestmove: RwLock<Option<BestMoveSink>>,
    last: Mutex<TerminalResult>,
    searching: AtomicBool,
}

impl CallbackBridge {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_on_update(&self, sink: Option<UpdateSink>) {
        *self.on_update.write() = sink;
    }

    pub fn set_on_bestmove(&self, sink: Option<BestMoveSink>) {
        *self.on_bestmove.write() = sink;
    }

    /// 探索の受け付けを試みる（既に探索中なら false）
    pub fn begin_search(&self) -> bool {
        self.searching
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// エンジンが探索を開始できなかった場合に受け付けを取り消す
    pub fn cancel_search(&self) {
        self.searching.store(false, Ordering::Release);
    }

    pub fn is_searching(&self) -> bool {
        self.searching.load(Ordering::Acquire)
    }

    pub fn last_result(&self) -> TerminalResult {
        self.last.lock().clone()
    }

    /// 探索情報の通知（受け手が無ければ捨てる）
    pub fn deliver_update(&self, info: &InfoFull) {
        let sink = self.on_update.read().clone();
        match sink {
            Some(sink) => sink(&ProgressRecord::from(info)),
            None => debug!("update dropped: no receiver (depth {})", info.depth),
        }
    }

    /// 最終結果の通知
    pub fn deliver_terminal(&self, best: &str, ponder: &str) {
        {
            let mut last = self.last.lock();
            last.best_move = best.to_string();
            last.ponder_move = ponder.to_string();
        }
        self.searching.store(false, Ordering::Release);

        let sink = self.on_bestmove.read().clone();
        if let Some(sink) = sink {
            sink(best, ponder);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rxiangqi_core::Value;

    fn sample_info(depth: i32) -> InfoFull {
        InfoFull {
            depth,
            sel_depth: depth + 3,
            time_ms: 12,
            nodes: (1 << 40) + 1,
            score: Value::new(-35),
            hashfull: 7,
            nps: 1 << 33,
            tb_hits: 0,
            pv: Vec::new(),
        }
    }

    #[test]
    fn test_progress_record_keeps_64bit() {
        let rec = ProgressRecord::from(&sample_info(5));
        assert_eq!(rec.nodes, (1 << 40) + 1);
        assert_eq!(rec.nps, 1 << 33);
        assert_eq!(rec.seldepth, 8);
        assert_eq!(rec.score, -35);

        let host = HostProgressRecord::from(&rec);
        assert_eq!(host.nodes, 1_099_511_627_777.0);
        assert_eq!(host.time, 12.0);

        let json = serde_json::to_value(&host).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        for key in ["depth", "seldepth", "time", "nodes", "score", "hashfull", "nps", "tbhits"] {
            assert!(keys.contains(&key), "missing {key}");
        }
    }

    #[test]
    fn test_terminal_clears_flag_before_callback() {
        let bridge = Arc::new(CallbackBridge::new());
        assert!(bridge.begin_search());
        assert!(!bridge.begin_search());

        let seen = Arc::new(Mutex::new(None));
        let (b, s) = (Arc::clone(&bridge), Arc::clone(&seen));
        bridge.set_on_bestmove(Some(Arc::new(move |best: &str, ponder: &str| {
            *s.lock() = Some((b.is_searching(), b.last_result(), best.to_string(), ponder.to_string()));
        })));

        bridge.deliver_terminal("h2e2", "h9g7");
        let (searching, cached, best, ponder) = seen.lock().clone().unwrap();
        assert!(!searching);
        assert_eq!(cached.best_move, "h2e2");
        assert_eq!(cached.ponder_move, "h9g7");
        assert_eq!((best.as_str(), ponder.as_str()), ("h2e2", "h9g7"));
    }

    #[test]
    fn test_empty_slots_drop_events() {
        let bridge = CallbackBridge::new();
        assert!(bridge.begin_search());
        bridge.deliver_update(&sample_info(1));
        bridge.deliver_terminal("(none)", "");
        assert!(!bridge.is_searching());
        assert_eq!(bridge.last_result().best_move, "(none)");
    }

    #[test]
    fn test_slot_swap() {
        let bridge = CallbackBridge::new();
        let count = Arc::new(Mutex::new(0));
        let c = Arc::clone(&count);
        bridge.set_on_update(Some(Arc::new(move |_: &ProgressRecord| *c.lock() += 1)));
        bridge.deliver_update(&sample_info(1));
        bridge.set_on_update(None);
        bridge.deliver_update(&sample_info(2));
        assert_eq!(*count.lock(), 1);
    }
}
