//! 探索ワーカー（反復深化 + PVS + 静止探索）
//!
//! 1スレッド分の探索状態を持つ。ワーカーはスレッドプールに常駐し、
//! History などの統計は `go` をまたいで引き継がれる。

use std::sync::atomic::{AtomicU64, Ordering};

use smallvec::SmallVec;

use super::info::{InfoFull, nps};
use super::limits::LimitsType;
use super::movepicker::{ButterflyHistory, MovePicker, stat_bonus};
use super::stop::StopSignal;
use super::time_manager::TimeManagement;
use crate::eval::{EvalNetwork, evaluate};
use crate::movegen::GenType;
use crate::position::Position;
use crate::tt::{Bound, TranspositionTable};
use crate::types::{Depth, MAX_PLY, Move, PieceType, Value};

/// ノード数を共有カウンタへ反映する間隔（2のべき乗 - 1）
const POLL_MASK: u64 = 511;

// =============================================================================
// SearchShared
// =============================================================================

/// 全ワーカーで共有する探索状態
pub(crate) struct SearchShared<'a> {
    pub tt: &'a TranspositionTable,
    pub net: &'a EvalNetwork,
    pub stop: &'a StopSignal,
    pub limits: &'a LimitsType,
    pub time: &'a TimeManagement,
    /// 全ワーカーの探索ノード数
    pub nodes: &'a AtomicU64,
}

// =============================================================================
// RootMove
// =============================================================================

/// ルートの指し手と直近の反復での評価
#[derive(Clone, Debug)]
pub(crate) struct RootMove {
    pub mv: Move,
    pub score: Value,
    pub sel_depth: i32,
    pub pv: Vec<Move>,
}

impl RootMove {
    fn new(mv: Move) -> Self {
        Self {
            mv,
            score: -Value::INFINITE,
            sel_depth: 0,
            pv: vec![mv],
        }
    }
}

// =============================================================================
// SearchWorker
// =============================================================================

pub struct SearchWorker {
    id: usize,
    history: ButterflyHistory,
    killers: Vec<[Move; 2]>,
    pv_table: Vec<Vec<Move>>,
    /// このワーカーの探索ノード数
    nodes: u64,
    /// 共有カウンタへ反映済みのノード数
    flushed: u64,
    sel_depth: i32,
    root_depth: Depth,
    stopped: bool,
    pub(crate) root_moves: Vec<RootMove>,
    /// 最後に完了した反復の結果
    pub(crate) completed: Option<RootMove>,
    pub(crate) completed_depth: Depth,
}

impl SearchWorker {
    pub fn new(id: usize) -> Self {
        let len = MAX_PLY as usize + 2;
        Self {
            id,
            history: ButterflyHistory::default(),
            killers: vec![[Move::NONE; 2]; len],
            pv_table: (0..len).map(|_| Vec::with_capacity(len)).collect(),
            nodes: 0,
            flushed: 0,
            sel_depth: 0,
            root_depth: 0,
            stopped: false,
            root_moves: Vec::new(),
            completed: None,
            completed_depth: 0,
        }
    }

    #[inline]
    pub fn id(&self) -> usize {
        self.id
    }

    #[inline]
    fn is_main(&self) -> bool {
        self.id == 0
    }

    /// 統計情報をクリア（`search_clear`）
    pub fn clear(&mut self) {
        self.history.clear();
        for k in self.killers.iter_mut() {
            *k = [Move::NONE; 2];
        }
    }

    /// 探索開始前の初期化
    pub(crate) fn prepare(&mut self, root_moves: &[Move]) {
        self.nodes = 0;
        self.flushed = 0;
        self.sel_depth = 0;
        self.root_depth = 0;
        self.stopped = false;
        self.root_moves = root_moves.iter().map(|&mv| RootMove::new(mv)).collect();
        self.completed = None;
        self.completed_depth = 0;
        for k in self.killers.iter_mut() {
            *k = [Move::NONE; 2];
        }
    }

    fn flush_nodes(&mut self, shared: &SearchShared) {
        shared.nodes.fetch_add(self.nodes - self.flushed, Ordering::Relaxed);
        self.flushed = self.nodes;
    }

    /// 中断判定
    ///
    /// 深さ1の反復は中断しない（必ず最善手を1つ持つため）。
    fn should_stop(&mut self, shared: &SearchShared) -> bool {
        if self.stopped {
            return true;
        }
        if self.nodes & POLL_MASK == 0 {
            self.flush_nodes(shared);
            if self.is_main() && self.root_depth > 1 {
                let limits = shared.limits;
                let out_of_time =
                    shared.time.enabled() && limits.elapsed() >= shared.time.maximum();
                let out_of_nodes = limits.has_nodes_limit()
                    && shared.nodes.load(Ordering::Relaxed) >= limits.nodes;
                if out_of_time || out_of_nodes {
                    shared.stop.request();
                }
            }
        }
        if self.root_depth > 1 && shared.stop.is_set() {
            self.stopped = true;
        }
        self.stopped
    }

    // =========================================================================
    // 反復深化
    // =========================================================================

    /// 反復深化
    ///
    /// メインワーカーは反復が完了するたびに `report` を呼ぶ。
    /// ヘルパーは停止フラグが立つまで深さをずらしながら探索を続ける。
    pub(crate) fn iterative_deepening(
        &mut self,
        pos: &mut Position,
        shared: &SearchShared,
        report: &dyn Fn(&InfoFull),
    ) {
        if self.root_moves.is_empty() {
            return;
        }

        for depth in 1..MAX_PLY {
            if depth > 1 && shared.stop.is_set() {
                break;
            }
            if self.is_main() && shared.limits.has_depth_limit() && depth > shared.limits.depth {
                break;
            }

            self.root_depth = depth;
            self.sel_depth = 0;
            let search_depth = if self.is_main() {
                depth
            } else {
                depth + (self.id % 2) as i32
            };

            let Some(score) = self.search_root(pos, shared, search_depth) else {
                break;
            };
            self.completed = self.root_moves.first().cloned();
            self.completed_depth = depth;

            if !self.is_main() {
                continue;
            }

            self.flush_nodes(shared);
            let time_ms = shared.limits.elapsed().max(0) as u64;
            let nodes = shared.nodes.load(Ordering::Relaxed);
            let best = &self.root_moves[0];
            let info = InfoFull {
                depth,
                sel_depth: best.sel_depth.max(depth),
                time_ms,
                nodes,
                score,
                hashfull: shared.tt.hashfull(),
                nps: nps(nodes, time_ms),
                tb_hits: 0,
                pv: best.pv.clone(),
            };
            log::trace!("{}", info.to_uci_string());
            report(&info);

            if shared.time.enabled() && shared.limits.elapsed() >= shared.time.optimum() {
                break;
            }
            if shared.limits.has_nodes_limit() && nodes >= shared.limits.nodes {
                break;
            }
        }
        self.flush_nodes(shared);
    }

    /// ルート局面の探索（中断された場合は None）
    fn search_root(&mut self, pos: &mut Position, shared: &SearchShared, depth: Depth) -> Option<Value> {
        let mut alpha = -Value::INFINITE;
        let beta = Value::INFINITE;

        for i in 0..self.root_moves.len() {
            let mv = self.root_moves[i].mv;
            self.nodes += 1;
            self.sel_depth = self.sel_depth.max(1);
            pos.do_move(mv);
            let ext = i32::from(pos.in_check());
            let new_depth = depth - 1 + ext;
            let mut value;
            if i == 0 {
                value = -self.search(pos, shared, -beta, -alpha, new_depth, 1, true);
            } else {
                value = -self.search(pos, shared, -alpha - 1, -alpha, new_depth, 1, true);
                if value > alpha && !self.stopped {
                    value = -self.search(pos, shared, -beta, -alpha, new_depth, 1, true);
                }
            }
            pos.undo_move();

            if self.stopped {
                return None;
            }

            let child_pv = &self.pv_table[1];
            let rm = &mut self.root_moves[i];
            if i == 0 || value > alpha {
                rm.score = value;
                rm.sel_depth = self.sel_depth;
                rm.pv.clear();
                rm.pv.push(mv);
                rm.pv.extend_from_slice(child_pv);
                if value > alpha {
                    alpha = value;
                }
            } else {
                rm.score = -Value::INFINITE;
            }
        }

        // 同点なら前の反復の順序を保つ
        self.root_moves.sort_by(|a, b| b.score.cmp(&a.score));
        Some(self.root_moves[0].score)
    }

    // =========================================================================
    // 通常探索
    // =========================================================================

    #[allow(clippy::too_many_arguments)]
    fn search(
        &mut self,
        pos: &mut Position,
        shared: &SearchShared,
        mut alpha: Value,
        mut beta: Value,
        depth: Depth,
        ply: i32,
        allow_null: bool,
    ) -> Value {
        if depth <= 0 {
            return self.qsearch(pos, shared, alpha, beta, ply);
        }

        let is_pv = beta.raw() - alpha.raw() > 1;
        self.pv_table[ply as usize].clear();
        self.nodes += 1;
        if self.should_stop(shared) {
            return Value::ZERO;
        }
        self.sel_depth = self.sel_depth.max(ply + 1);

        if pos.is_repetition() {
            return Value::DRAW;
        }
        if ply >= MAX_PLY - 1 {
            return evaluate(pos, shared.net);
        }

        // 詰みまでの距離による枝刈り
        alpha = alpha.max(Value::mated_in(ply));
        beta = beta.min(Value::mate_in(ply + 1));
        if alpha >= beta {
            return alpha;
        }

        let key = pos.key();
        let tt_data = shared.tt.probe(key);
        let tt_move = tt_data.map_or(Move::NONE, |d| d.mv);
        if !is_pv {
            if let Some(d) = tt_data {
                let v = d.value.from_tt(ply);
                if d.depth >= depth
                    && d.value != Value::NONE
                    && ((d.bound.includes_lower() && v >= beta)
                        || (d.bound.includes_upper() && v <= alpha))
                {
                    return v;
                }
            }
        }

        let us = pos.side_to_move();
        let in_check = pos.in_check();
        let static_eval = if in_check {
            Value::NONE
        } else {
            tt_data
                .map(|d| d.eval)
                .filter(|&e| e != Value::NONE)
                .unwrap_or_else(|| evaluate(pos, shared.net))
        };

        // Null move pruning
        if !is_pv
            && !in_check
            && allow_null
            && depth >= 3
            && static_eval >= beta
            && !beta.is_mate_score()
            && pos
                .pieces(us)
                .any(|(_, pt)| matches!(pt, PieceType::Rook | PieceType::Knight | PieceType::Cannon))
        {
            let r = 2 + depth / 4;
            pos.do_null_move();
            let v = -self.search(pos, shared, -beta, -beta + 1, depth - 1 - r, ply + 1, false);
            pos.undo_null_move();
            if self.stopped {
                return Value::ZERO;
            }
            if v >= beta {
                return if v.is_win() { beta } else { v };
            }
        }

        let killers = self.killers[ply as usize];
        let picker = MovePicker::new(pos, GenType::All, tt_move, killers, &self.history);

        let mut best_value = -Value::INFINITE;
        let mut best_move = Move::NONE;
        let mut move_count = 0;
        let mut quiets_tried: SmallVec<[Move; 32]> = SmallVec::new();

        for mv in picker {
            let capture = pos.is_capture(mv);
            pos.do_move(mv);
            if pos.is_king_attacked(us) {
                pos.undo_move();
                continue;
            }
            move_count += 1;

            let gives_check = pos.in_check();
            let ext = i32::from(gives_check && ply < 2 * self.root_depth);
            let new_depth = depth - 1 + ext;

            let mut value;
            if move_count == 1 {
                value = -self.search(pos, shared, -beta, -alpha, new_depth, ply + 1, true);
            } else {
                // Late move reduction
                let reduction = if depth >= 3 && move_count > 3 && !capture && !gives_check && !in_check
                {
                    1 + i32::from(move_count > 10)
                } else {
                    0
                };
                value = -self.search(
                    pos,
                    shared,
                    -alpha - 1,
                    -alpha,
                    new_depth - reduction,
                    ply + 1,
                    true,
                );
                if value > alpha && reduction > 0 && !self.stopped {
                    value = -self.search(pos, shared, -alpha - 1, -alpha, new_depth, ply + 1, true);
                }
                if value > alpha && value < beta && !self.stopped {
                    value = -self.search(pos, shared, -beta, -alpha, new_depth, ply + 1, true);
                }
            }
            pos.undo_move();

            if self.stopped {
                return Value::ZERO;
            }

            if value > best_value {
                best_value = value;
                if value > alpha {
                    best_move = mv;
                    self.update_pv(ply, mv);
                    if value >= beta {
                        if !capture {
                            self.update_quiet_stats(pos, ply, depth, mv, &quiets_tried);
                        }
                        break;
                    }
                    alpha = value;
                }
            }
            if !capture && quiets_tried.len() < quiets_tried.inline_size() {
                quiets_tried.push(mv);
            }
        }

        // 合法手が無ければ負け（象棋ではステイルメイトも負け）
        if move_count == 0 {
            return Value::mated_in(ply);
        }

        let bound = if best_value >= beta {
            Bound::Lower
        } else if is_pv && !best_move.is_none() {
            Bound::Exact
        } else {
            Bound::Upper
        };
        shared
            .tt
            .store(key, best_value.to_tt(ply), bound, depth, best_move, static_eval);

        best_value
    }

    // =========================================================================
    // 静止探索
    // =========================================================================

    fn qsearch(
        &mut self,
        pos: &mut Position,
        shared: &SearchShared,
        mut alpha: Value,
        beta: Value,
        ply: i32,
    ) -> Value {
        self.pv_table[ply as usize].clear();
        self.nodes += 1;
        if self.should_stop(shared) {
            return Value::ZERO;
        }
        self.sel_depth = self.sel_depth.max(ply + 1);

        if pos.is_repetition() {
            return Value::DRAW;
        }
        if ply >= MAX_PLY - 1 {
            return evaluate(pos, shared.net);
        }

        let us = pos.side_to_move();
        let in_check = pos.in_check();
        let mut best_value = -Value::INFINITE;
        if !in_check {
            let stand_pat = evaluate(pos, shared.net);
            if stand_pat >= beta {
                return stand_pat;
            }
            if stand_pat > alpha {
                alpha = stand_pat;
            }
            best_value = stand_pat;
        }

        let gen_type = if in_check { GenType::All } else { GenType::Captures };
        let picker = MovePicker::new(pos, gen_type, Move::NONE, [Move::NONE; 2], &self.history);

        let mut move_count = 0;
        for mv in picker {
            pos.do_move(mv);
            if pos.is_king_attacked(us) {
                pos.undo_move();
                continue;
            }
            move_count += 1;
            let value = -self.qsearch(pos, shared, -beta, -alpha, ply + 1);
            pos.undo_move();

            if self.stopped {
                return Value::ZERO;
            }
            if value > best_value {
                best_value = value;
                if value > alpha {
                    self.update_pv(ply, mv);
                    if value >= beta {
                        break;
                    }
                    alpha = value;
                }
            }
        }

        if in_check && move_count == 0 {
            return Value::mated_in(ply);
        }
        best_value
    }

    // =========================================================================
    // 補助
    // =========================================================================

    fn update_pv(&mut self, ply: i32, mv: Move) {
        let ply = ply as usize;
        let (head, tail) = self.pv_table.split_at_mut(ply + 1);
        let line = &mut head[ply];
        line.clear();
        line.push(mv);
        line.extend_from_slice(&tail[0]);
    }

    fn update_quiet_stats(&mut self, pos: &Position, ply: i32, depth: Depth, best: Move, quiets: &[Move]) {
        let killers = &mut self.killers[ply as usize];
        if killers[0] != best {
            killers[1] = killers[0];
            killers[0] = best;
        }
        let bonus = stat_bonus(depth);
        if let Some(pc) = pos.piece_on(best.from()) {
            self.history.update(pc, best.to(), bonus);
        }
        for &mv in quiets {
            if let Some(pc) = pos.piece_on(mv.from()) {
                self.history.update(pc, mv.to(), -bonus);
            }
        }
    }
}
