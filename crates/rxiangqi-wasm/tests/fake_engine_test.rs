//! 台本どおりに動く偽エンジンでアダプタの契約を確かめる

use std::sync::Arc;

use parking_lot::Mutex;
use rxiangqi_core::{BestMoveCallback, EngineError, InfoFull, LimitsType, UpdateCallback, Value};
use rxiangqi_wasm::{AdapterError, AdapterInstance, ProgressRecord, SearchEngine};

#[derive(Default)]
struct Script {
    calls: Vec<String>,
    limits: Vec<LimitsType>,
    on_bestmove: Option<BestMoveCallback>,
    on_update: Option<UpdateCallback>,
    fail_load: bool,
    fail_go: bool,
    /// go の中で探索を終える（スレッドの無い環境）
    inline: bool,
}

#[derive(Clone, Default)]
struct FakeEngine {
    script: Arc<Mutex<Script>>,
}

impl FakeEngine {
    fn record(&self, call: impl Into<String>) {
        self.script.lock().calls.push(call.into());
    }

    fn calls(&self) -> Vec<String> {
        self.script.lock().calls.clone()
    }

    fn last_limits(&self) -> LimitsType {
        self.script.lock().limits.last().cloned().unwrap()
    }

    fn emit_update(&self, depth: i32) {
        let cb = self.script.lock().on_update.clone();
        let info = InfoFull {
            depth,
            sel_depth: depth,
            time_ms: depth as u64,
            nodes: 1 << 41,
            score: Value::new(12),
            hashfull: 3,
            nps: 1 << 35,
            tb_hits: 0,
            pv: Vec::new(),
        };
        if let Some(cb) = cb {
            cb(&info);
        }
    }

    fn emit_bestmove(&self, best: &str, ponder: &str) {
        let cb = self.script.lock().on_bestmove.clone();
        if let Some(cb) = cb {
            cb(best, ponder);
        }
    }
}

impl SearchEngine for FakeEngine {
    fn load_networks(&mut self) -> Result<(), EngineError> {
        self.record("load_networks");
        if self.script.lock().fail_load {
            return Err(EngineError::NetworkLoad("missing file".to_string()));
        }
        Ok(())
    }

    fn verify_networks(&self) -> Result<(), EngineError> {
        self.record("verify_networks");
        Ok(())
    }

    fn set_position(&mut self, fen: &str, moves: &[String]) -> Result<(), EngineError> {
        self.record(format!("set_position {fen} [{}]", moves.join(",")));
        Ok(())
    }

    fn go(&mut self, limits: LimitsType) -> Result<(), EngineError> {
        self.record("go");
        let mut script = self.script.lock();
        if script.fail_go {
            return Err(EngineError::ThreadSpawn("no threads".to_string()));
        }
        script.limits.push(limits);
        Ok(())
    }

    fn searches_in_background(&self) -> bool {
        !self.script.lock().inline
    }

    fn stop(&self) {
        self.record("stop");
    }

    fn wait_for_search_finished(&self) {
        self.record("wait");
    }

    fn fen(&self) -> String {
        "fake-fen".to_string()
    }

    fn visualize(&self) -> String {
        "fake-board".to_string()
    }

    fn get_hashfull(&self) -> u32 {
        42
    }

    fn search_clear(&mut self) {
        self.record("search_clear");
    }

    fn set_tt_size(&mut self, mb: usize) -> Result<(), EngineError> {
        self.record(format!("set_tt_size {mb}"));
        Ok(())
    }

    fn resize_threads(&mut self) {
        self.record("resize_threads");
    }

    fn perft(&mut self, fen: &str, depth: u32) -> Result<u64, EngineError> {
        self.record(format!("perft {fen} {depth}"));
        Ok(44)
    }

    fn has_option(&self, name: &str) -> bool {
        ["Threads", "Hash", "Clear Hash"].contains(&name)
    }

    fn set_option(&mut self, name: &str, value: &str) -> Result<(), EngineError> {
        self.record(format!("set_option {name}={value}"));
        Ok(())
    }

    fn options_text(&self) -> String {
        "option name Hash type spin default 16 min 1 max 33554432\n".to_string()
    }

    fn set_on_bestmove(&self, cb: Option<BestMoveCallback>) {
        self.script.lock().on_bestmove = cb;
    }

    fn set_on_update_full(&self, cb: Option<UpdateCallback>) {
        self.script.lock().on_update = cb;
    }
}

fn adapter() -> (AdapterInstance<FakeEngine>, FakeEngine) {
    let fake = FakeEngine::default();
    (AdapterInstance::with_engine(fake.clone()), fake)
}

#[test]
fn test_construction_registers_trampolines() {
    let (adapter, fake) = adapter();
    assert!(fake.script.lock().on_bestmove.is_some());
    assert!(fake.script.lock().on_update.is_some());
    assert!(!adapter.is_searching());
    assert_eq!(adapter.best_move(), "");
    assert_eq!(adapter.ponder_move(), "");
}

#[test]
fn test_limits_forwarded_verbatim() {
    let (mut adapter, fake) = adapter();

    adapter.go_depth(7).unwrap();
    let limits = fake.last_limits();
    assert_eq!((limits.depth, limits.nodes, limits.infinite), (7, 0, false));
    assert_eq!(limits.time, [0, 0]);
    fake.emit_bestmove("a0a1", "");

    adapter.go_time(2500).unwrap();
    assert_eq!(fake.last_limits().time, [2500, 2500]);
    fake.emit_bestmove("a0a1", "");

    adapter.go_nodes(u64::MAX).unwrap();
    assert_eq!(fake.last_limits().nodes, u64::MAX);
    fake.emit_bestmove("a0a1", "");

    adapter.go_infinite().unwrap();
    assert!(fake.last_limits().infinite);
    fake.emit_bestmove("a0a1", "");

    adapter.go_move_time(300).unwrap();
    assert_eq!(fake.last_limits().movetime, 300);
    fake.emit_bestmove("a0a1", "");
}

#[test]
fn test_searching_flag_and_cache_before_callback() {
    let (mut adapter, fake) = adapter();
    let adapter_seen = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&adapter_seen);
    adapter.set_on_bestmove(Some(Arc::new(move |best: &str, ponder: &str| {
        seen.lock().push((best.to_string(), ponder.to_string()));
    })));

    adapter.go_depth(3).unwrap();
    assert!(adapter.is_searching());
    // 探索中の go は拒否される
    assert!(matches!(
        adapter.go_depth(3),
        Err(AdapterError::SearchInProgress { operation: "go" })
    ));
    assert_eq!(fake.script.lock().limits.len(), 1);

    fake.emit_bestmove("h2e2", "h9g7");
    assert!(!adapter.is_searching());
    assert_eq!(adapter.best_move(), "h2e2");
    assert_eq!(adapter.ponder_move(), "h9g7");
    assert_eq!(
        *adapter_seen.lock(),
        vec![("h2e2".to_string(), "h9g7".to_string())]
    );

    // 次の探索が終わるまでキャッシュは前回の結果のまま
    adapter.go_depth(1).unwrap();
    assert_eq!(adapter.best_move(), "h2e2");
    fake.emit_bestmove("(none)", "");
    assert_eq!(adapter.best_move(), "(none)");
    assert_eq!(adapter.ponder_move(), "");
}

#[test]
fn test_go_failure_rolls_back_flag() {
    let (mut adapter, fake) = adapter();
    fake.script.lock().fail_go = true;
    assert!(matches!(
        adapter.go_depth(1),
        Err(AdapterError::Engine(EngineError::ThreadSpawn(_)))
    ));
    assert!(!adapter.is_searching());
}

#[test]
fn test_inline_engine_rejects_infinite() {
    let (mut adapter, fake) = adapter();
    fake.script.lock().inline = true;
    assert!(matches!(
        adapter.go_infinite(),
        Err(AdapterError::InfiniteWithoutThreads)
    ));
    assert!(!adapter.is_searching());
    assert!(fake.calls().is_empty());

    // 有限の探索は受け付ける
    adapter.go_depth(2).unwrap();
    assert_eq!(fake.calls(), vec!["go"]);
    fake.emit_bestmove("h2e2", "");
    assert_eq!(adapter.best_move(), "h2e2");
}

#[test]
fn test_updates_are_converted() {
    let (mut adapter, fake) = adapter();
    let records = Arc::new(Mutex::new(Vec::<ProgressRecord>::new()));
    let r = Arc::clone(&records);
    adapter.set_on_update(Some(Arc::new(move |rec: &ProgressRecord| r.lock().push(rec.clone()))));

    adapter.go_infinite().unwrap();
    fake.emit_update(1);
    fake.emit_update(2);
    fake.emit_bestmove("a0a1", "");

    let records = records.lock();
    assert_eq!(records.iter().map(|r| r.depth).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(records[0].nodes, 1 << 41);
    assert_eq!(records[0].nps, 1 << 35);
    assert_eq!(records[0].score, 12);
}

#[test]
fn test_init_swallows_and_try_init_reports() {
    let (mut adapter, fake) = adapter();
    fake.script.lock().fail_load = true;
    adapter.init();
    assert!(matches!(
        adapter.try_init(),
        Err(AdapterError::Engine(EngineError::NetworkLoad(_)))
    ));

    fake.script.lock().fail_load = false;
    adapter.try_init().unwrap();
    assert_eq!(
        fake.calls().iter().filter(|c| *c == "verify_networks").count(),
        1
    );
}

#[test]
fn test_options_proxy() {
    let (mut adapter, fake) = adapter();
    adapter.set_option("Hash", "64").unwrap();
    adapter.set_option("NoSuchOption", "1").unwrap();
    adapter.set_threads(4).unwrap();
    adapter.set_hash_size(128).unwrap();
    adapter.clear_hash().unwrap();
    assert_eq!(adapter.hash_full(), 42);
    assert!(adapter.options_text().starts_with("option name Hash"));

    assert_eq!(
        fake.calls(),
        vec![
            "set_option Hash=64",
            "set_option Threads=4",
            "resize_threads",
            "set_tt_size 128",
            "search_clear",
        ]
    );
}

#[test]
fn test_mutations_rejected_while_searching() {
    let (mut adapter, fake) = adapter();
    adapter.go_infinite().unwrap();

    assert!(adapter.set_position("startpos").is_err());
    assert!(adapter.set_option("Hash", "1").is_err());
    assert!(adapter.set_hash_size(1).is_err());
    assert!(adapter.clear_hash().is_err());
    assert!(adapter.set_threads(2).is_err());
    assert!(adapter.perft("startpos", 1).is_err());
    // 参照系は探索中でも使える
    assert_eq!(adapter.fen(), "fake-fen");
    assert_eq!(adapter.visualize(), "fake-board");
    assert_eq!(fake.calls(), vec!["go"]);

    fake.emit_bestmove("a0a1", "");
    adapter
        .set_position_with_moves("startpos", &["h2e2".to_string(), "h9g7".to_string()])
        .unwrap();
    assert_eq!(adapter.perft("startpos", 1).unwrap(), 44);
    assert!(fake.calls().contains(&"set_position startpos [h2e2,h9g7]".to_string()));
}

#[test]
fn test_stop_only_while_searching() {
    let (mut adapter, fake) = adapter();
    adapter.stop();
    assert!(fake.calls().is_empty());

    adapter.go_infinite().unwrap();
    adapter.stop();
    adapter.stop();
    assert_eq!(fake.calls(), vec!["go", "stop", "stop"]);
    fake.emit_bestmove("a0a1", "");
}

#[test]
fn test_drop_stops_running_search() {
    let (mut adapter, fake) = adapter();
    adapter.go_infinite().unwrap();
    drop(adapter);
    assert_eq!(fake.calls(), vec!["go", "stop", "wait"]);

    let (adapter, fake) = self::adapter();
    drop(adapter);
    assert!(fake.calls().is_empty());
}
