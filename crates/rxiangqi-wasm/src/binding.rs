//! `PikafishWASM` 互換の JavaScript バインディング
//!
//! JavaScript の関数はスレッド間で共有できないため、インスタンスごとにスレッドローカルへ置き、
//! アダプタにはインスタンス番号だけを持つトランポリンを渡す。
//! 64bit の値は f64 へ広げて渡す。

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::sync::Arc;

use js_sys::Function;
use log::warn;
use wasm_bindgen::prelude::*;

use crate::adapter::AdapterInstance;
use crate::bridge::{BestMoveSink, HostProgressRecord, ProgressRecord, UpdateSink};

#[derive(Default)]
struct HostCallbacks {
    on_update: Option<Function>,
    on_bestmove: Option<Function>,
}

thread_local! {
    static CALLBACKS: RefCell<HashMap<u32, HostCallbacks>> = RefCell::new(HashMap::new());
    static NEXT_ID: Cell<u32> = const { Cell::new(1) };
}

#[wasm_bindgen(start)]
fn start() {
    #[cfg(feature = "console")]
    {
        console_error_panic_hook::set_once();
        wasm_logger::init(wasm_logger::Config::new(log::Level::Info));
    }
}

fn call_update(id: u32, rec: &ProgressRecord) {
    let f = CALLBACKS.with(|m| m.borrow().get(&id).and_then(|c| c.on_update.clone()));
    let Some(f) = f else {
        return;
    };
    let value = match serde_wasm_bindgen::to_value(&HostProgressRecord::from(rec)) {
        Ok(v) => v,
        Err(e) => {
            warn!("failed to convert update record: {e}");
            return;
        }
    };
    if let Err(e) = f.call1(&JsValue::NULL, &value) {
        warn!("onUpdate threw: {e:?}");
    }
}

fn call_bestmove(id: u32, best: &str, ponder: &str) {
    let f = CALLBACKS.with(|m| m.borrow().get(&id).and_then(|c| c.on_bestmove.clone()));
    let Some(f) = f else {
        return;
    };
    if let Err(e) = f.call2(&JsValue::NULL, &JsValue::from_str(best), &JsValue::from_str(ponder)) {
        warn!("onBestMove threw: {e:?}");
    }
}

fn to_js_error(e: impl std::fmt::Display) -> JsError {
    JsError::new(&e.to_string())
}

#[wasm_bindgen(js_name = PikafishWASM)]
pub struct PikafishWasm {
    id: u32,
    adapter: AdapterInstance,
}

impl Default for PikafishWasm {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen(js_class = PikafishWASM)]
impl PikafishWasm {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        let id = NEXT_ID.with(|n| {
            let id = n.get();
            n.set(id.wrapping_add(1));
            id
        });
        CALLBACKS.with(|m| m.borrow_mut().insert(id, HostCallbacks::default()));
        Self {
            id,
            adapter: AdapterInstance::new(),
        }
    }

    pub fn init(&mut self) {
        self.adapter.init();
    }

    /// `init` と同じだが、失敗を例外として返す
    #[wasm_bindgen(js_name = initChecked)]
    pub fn init_checked(&mut self) -> Result<(), JsError> {
        self.adapter.try_init().map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = setPosition)]
    pub fn set_position(&mut self, fen: &str) -> Result<(), JsError> {
        self.adapter.set_position(fen).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = setPositionWithMoves)]
    pub fn set_position_with_moves(&mut self, fen: &str, moves: Vec<String>) -> Result<(), JsError> {
        self.adapter
            .set_position_with_moves(fen, &moves)
            .map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = goDepth)]
    pub fn go_depth(&mut self, depth: i32) -> Result<(), JsError> {
        self.adapter.go_depth(depth).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = goTime)]
    pub fn go_time(&mut self, time_ms: i32) -> Result<(), JsError> {
        self.adapter.go_time(i64::from(time_ms)).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = goNodes)]
    pub fn go_nodes(&mut self, nodes: u64) -> Result<(), JsError> {
        self.adapter.go_nodes(nodes).map_err(to_js_error)
    }

    /// この環境では探索が `go` の中で完了するため、止められない無制限探索は例外になる
    #[wasm_bindgen(js_name = goInfinite)]
    pub fn go_infinite(&mut self) -> Result<(), JsError> {
        self.adapter.go_infinite().map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = goMoveTime)]
    pub fn go_move_time(&mut self, time_ms: i32) -> Result<(), JsError> {
        self.adapter.go_move_time(i64::from(time_ms)).map_err(to_js_error)
    }

    pub fn stop(&self) {
        self.adapter.stop();
    }

    #[wasm_bindgen(js_name = waitForSearchFinished)]
    pub fn wait_for_search_finished(&self) {
        self.adapter.wait_for_search_finished();
    }

    #[wasm_bindgen(js_name = getBestMove)]
    pub fn get_best_move(&self) -> String {
        self.adapter.best_move()
    }

    #[wasm_bindgen(js_name = getPonderMove)]
    pub fn get_ponder_move(&self) -> String {
        self.adapter.ponder_move()
    }

    #[wasm_bindgen(js_name = isSearching)]
    pub fn is_searching(&self) -> bool {
        self.adapter.is_searching()
    }

    #[wasm_bindgen(js_name = getFen)]
    pub fn get_fen(&self) -> String {
        self.adapter.fen()
    }

    pub fn visualize(&self) -> String {
        self.adapter.visualize()
    }

    #[wasm_bindgen(js_name = setOption)]
    pub fn set_option(&mut self, name: &str, value: &str) -> Result<(), JsError> {
        self.adapter.set_option(name, value).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = getOptions)]
    pub fn get_options(&self) -> String {
        self.adapter.options_text()
    }

    #[wasm_bindgen(js_name = getHashFull)]
    pub fn get_hash_full(&self) -> u32 {
        self.adapter.hash_full()
    }

    #[wasm_bindgen(js_name = clearHash)]
    pub fn clear_hash(&mut self) -> Result<(), JsError> {
        self.adapter.clear_hash().map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = setHashSize)]
    pub fn set_hash_size(&mut self, mb: u32) -> Result<(), JsError> {
        self.adapter.set_hash_size(mb as usize).map_err(to_js_error)
    }

    #[wasm_bindgen(js_name = setThreads)]
    pub fn set_threads(&mut self, threads: u32) -> Result<(), JsError> {
        self.adapter.set_threads(threads as usize).map_err(to_js_error)
    }

    /// `null` / `undefined` で通知を止める
    #[wasm_bindgen(js_name = setOnUpdate)]
    pub fn set_on_update(&self, callback: Option<Function>) {
        let enabled = callback.is_some();
        CALLBACKS.with(|m| m.borrow_mut().entry(self.id).or_default().on_update = callback);
        let id = self.id;
        let sink: Option<UpdateSink> = if enabled {
            Some(Arc::new(move |rec: &ProgressRecord| call_update(id, rec)))
        } else {
            None
        };
        self.adapter.set_on_update(sink);
    }

    #[wasm_bindgen(js_name = setOnBestMove)]
    pub fn set_on_best_move(&self, callback: Option<Function>) {
        let enabled = callback.is_some();
        CALLBACKS.with(|m| m.borrow_mut().entry(self.id).or_default().on_bestmove = callback);
        let id = self.id;
        let sink: Option<BestMoveSink> = if enabled {
            Some(Arc::new(move |best: &str, ponder: &str| call_bestmove(id, best, ponder)))
        } else {
            None
        };
        self.adapter.set_on_bestmove(sink);
    }

    /// perft（ノード数は BigInt）
    pub fn perft(&mut self, fen: &str, depth: u32) -> Result<u64, JsError> {
        self.adapter.perft(fen, depth).map_err(to_js_error)
    }
}

impl Drop for PikafishWasm {
    fn drop(&mut self) {
        CALLBACKS.with(|m| m.borrow_mut().remove(&self.id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    #[wasm_bindgen_test]
    fn test_update_record_is_widened() {
        let rec = ProgressRecord {
            depth: 3,
            seldepth: 5,
            time: 10,
            nodes: (1 << 40) + 1,
            score: 17,
            hashfull: 2,
            nps: 1 << 33,
            tbhits: 0,
        };
        let value = serde_wasm_bindgen::to_value(&HostProgressRecord::from(&rec)).unwrap();
        let nodes = js_sys::Reflect::get(&value, &JsValue::from_str("nodes")).unwrap();
        assert_eq!(nodes.as_f64(), Some(1_099_511_627_777.0));
        let depth = js_sys::Reflect::get(&value, &JsValue::from_str("depth")).unwrap();
        assert_eq!(depth.as_f64(), Some(3.0));
    }

    #[wasm_bindgen_test]
    fn test_inline_search_delivers_bestmove() {
        let mut engine = PikafishWasm::new();
        engine.go_depth(2).unwrap();
        // スレッドが無い環境では go の中で探索が終わる
        assert!(!engine.is_searching());
        assert!(!engine.get_best_move().is_empty());
        assert_eq!(engine.perft("startpos", 1).unwrap(), 44);
    }

    #[wasm_bindgen_test]
    fn test_infinite_rejected_without_threads() {
        let mut engine = PikafishWasm::new();
        assert!(engine.go_infinite().is_err());
        assert!(!engine.is_searching());
        engine.go_depth(1).unwrap();
        assert!(!engine.get_best_move().is_empty());
    }
}
