//! 探索情報（反復ごとの進捗通知）

use crate::types::{Move, Value};

/// 反復深化の1反復が完了するたびに通知される探索情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoFull {
    /// 探索深さ
    pub depth: i32,
    /// 選択的深さ
    pub sel_depth: i32,
    /// 経過時間（ミリ秒）
    pub time_ms: u64,
    /// 全スレッドの探索ノード数
    pub nodes: u64,
    /// 最善手のスコア（手番側から見た値）
    pub score: Value,
    /// 置換表使用率（千分率）
    pub hashfull: u32,
    /// NPS (nodes per second)
    pub nps: u64,
    /// 終盤データベースのヒット数（未対応のため常に 0）
    pub tb_hits: u64,
    /// Principal Variation
    pub pv: Vec<Move>,
}

impl InfoFull {
    /// UCI形式のinfo文字列を生成
    pub fn to_uci_string(&self) -> String {
        let score = if self.score.is_mate_score() && self.score.raw().abs() < Value::INFINITE.raw() {
            let plies = Value::MATE.raw() - self.score.raw().abs();
            let moves = (plies + 1) / 2;
            if self.score.is_loss() {
                format!("mate -{moves}")
            } else {
                format!("mate {moves}")
            }
        } else {
            format!("cp {}", self.score.raw())
        };

        let mut s = format!(
            "info depth {} seldepth {} score {score} nodes {} nps {} hashfull {} tbhits {} time {}",
            self.depth, self.sel_depth, self.nodes, self.nps, self.hashfull, self.tb_hits, self.time_ms
        );
        if !self.pv.is_empty() {
            s.push_str(" pv");
            for m in &self.pv {
                s.push(' ');
                s.push_str(&m.to_uci());
            }
        }
        s
    }
}

/// NPS を計算（経過 0ms でも割り算しない）
#[inline]
pub(crate) fn nps(nodes: u64, time_ms: u64) -> u64 {
    nodes.saturating_mul(1000) / time_ms.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(score: Value) -> InfoFull {
        InfoFull {
            depth: 3,
            sel_depth: 7,
            time_ms: 12,
            nodes: 3456,
            score,
            hashfull: 1,
            nps: nps(3456, 12),
            tb_hits: 0,
            pv: vec![Move::from_uci("h2e2").unwrap(), Move::from_uci("h9g7").unwrap()],
        }
    }

    #[test]
    fn test_uci_string() {
        let s = info(Value::new(25)).to_uci_string();
        assert_eq!(
            s,
            "info depth 3 seldepth 7 score cp 25 nodes 3456 nps 288000 hashfull 1 tbhits 0 time 12 pv h2e2 h9g7"
        );
    }

    #[test]
    fn test_mate_string() {
        assert!(info(Value::mate_in(3)).to_uci_string().contains("score mate 2"));
        assert!(info(Value::mated_in(4)).to_uci_string().contains("score mate -2"));
    }

    #[test]
    fn test_nps_zero_time() {
        assert_eq!(nps(500, 0), 500_000);
    }
}
