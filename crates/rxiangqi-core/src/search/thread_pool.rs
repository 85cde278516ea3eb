//! スレッドプール（Lazy SMP）
//!
//! ワーカー0がメインスレッドとして反復ごとの情報通知と時間管理を担当し、
//! ヘルパーは置換表と停止フラグを共有して同じ局面を並列に探索する。
//! ヘルパースレッドは `std::thread::scope` 内で起動し、探索終了時に必ず join される。

use std::sync::atomic::Ordering;

use super::info::InfoFull;
use super::worker::{SearchShared, SearchWorker};
use crate::movegen;
use crate::position::Position;
use crate::types::{Move, Value};

/// ヘルパースレッドのスタックサイズ
pub(crate) const SEARCH_STACK_SIZE: usize = 16 * 1024 * 1024;

/// 探索結果
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchResult {
    /// 最善手（合法手が無ければ `Move::NONE`）
    pub best_move: Move,
    /// 予想応手（無ければ `Move::NONE`）
    pub ponder_move: Move,
    pub score: Value,
    /// 完了した反復の深さ
    pub depth: i32,
}

impl SearchResult {
    /// UCI `bestmove` の表記（合法手が無い場合は `(none)`）
    pub fn best_move_str(&self) -> String {
        if self.best_move.is_none() {
            "(none)".to_string()
        } else {
            self.best_move.to_uci()
        }
    }

    /// 予想応手の表記（無い場合は空文字列）
    pub fn ponder_move_str(&self) -> String {
        if self.ponder_move.is_none() {
            String::new()
        } else {
            self.ponder_move.to_uci()
        }
    }
}

pub struct ThreadPool {
    workers: Vec<SearchWorker>,
}

impl ThreadPool {
    pub fn new(num_threads: usize) -> Self {
        let mut pool = Self {
            workers: Vec::new(),
        };
        pool.set_num_threads(num_threads);
        pool
    }

    /// スレッド数を変更（ワーカーの統計は作り直される）
    pub fn set_num_threads(&mut self, num_threads: usize) {
        let num_threads = num_threads.max(1);
        if num_threads == self.workers.len() {
            return;
        }
        self.workers = (0..num_threads).map(SearchWorker::new).collect();
        log::debug!("thread pool resized to {num_threads}");
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// 全ワーカーの History などをクリア
    pub fn clear(&mut self) {
        for worker in self.workers.iter_mut() {
            worker.clear();
        }
    }

    /// 探索を実行し、終了まで呼び出しスレッドをブロックする
    ///
    /// 無制限探索（`infinite`）では反復深化が終わっても停止フラグが立つまで結果を返さない。
    pub(crate) fn start_thinking(
        &mut self,
        pos: &Position,
        shared: &SearchShared,
        report: &(dyn Fn(&InfoFull) + Sync),
    ) -> SearchResult {
        shared.tt.new_search();
        shared.nodes.store(0, Ordering::Relaxed);

        let mut root = pos.clone();
        let root_moves: Vec<Move> = movegen::generate_legal(&mut root).into_iter().collect();
        for worker in self.workers.iter_mut() {
            worker.prepare(&root_moves);
        }

        let Some((main, helpers)) = self.workers.split_first_mut() else {
            return SearchResult {
                best_move: Move::NONE,
                ponder_move: Move::NONE,
                score: Value::ZERO,
                depth: 0,
            };
        };

        let run_helpers = !root_moves.is_empty() && parallel_supported();
        std::thread::scope(|scope| {
            // メインの探索がパニックしてもヘルパーを止めてから scope を抜ける
            let _stop_helpers = shared.stop.request_on_drop();
            if run_helpers {
                for helper in helpers.iter_mut() {
                    let mut helper_pos = pos.clone();
                    let spawned = std::thread::Builder::new()
                        .name(format!("rxiangqi-helper-{}", helper.id()))
                        .stack_size(SEARCH_STACK_SIZE)
                        .spawn_scoped(scope, move || {
                            helper.iterative_deepening(&mut helper_pos, shared, &|_| {});
                        });
                    if let Err(e) = spawned {
                        log::warn!("failed to spawn search helper thread: {e}");
                    }
                }
            }

            main.iterative_deepening(&mut root, shared, report);

            if shared.limits.infinite && parallel_supported() {
                shared.stop.wait();
            }
        });

        let Some(best) = main.completed.clone() else {
            return SearchResult {
                best_move: Move::NONE,
                ponder_move: Move::NONE,
                score: Value::ZERO,
                depth: 0,
            };
        };

        let ponder_move = best
            .pv
            .get(1)
            .copied()
            .or_else(|| ponder_from_tt(&mut root, shared, best.mv))
            .unwrap_or(Move::NONE);

        SearchResult {
            best_move: best.mv,
            ponder_move,
            score: best.score,
            depth: main.completed_depth,
        }
    }
}

/// PV が1手しかない場合、最善手を指した局面の置換表から応手を拾う
fn ponder_from_tt(pos: &mut Position, shared: &SearchShared, best: Move) -> Option<Move> {
    pos.do_move(best);
    let mv = shared
        .tt
        .probe(pos.key())
        .map(|d| d.mv)
        .filter(|&mv| movegen::is_legal(pos, mv));
    pos.undo_move();
    mv
}

/// スレッドを起動できる環境か
#[inline]
pub const fn parallel_supported() -> bool {
    !cfg!(all(target_arch = "wasm32", not(target_feature = "atomics")))
}
