//! 探索制限の組み立て
//!
//! 値は解釈せずにそのままエンジンへ渡す。

use rxiangqi_core::search::TimePoint;
use rxiangqi_core::{Color, LimitsType};

/// 1回の go に対応する探索制限
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LimitsDescriptor {
    pub depth: Option<i32>,
    pub nodes: Option<u64>,
    /// 手番ごとの持ち時間（ms）
    pub time: Option<[TimePoint; Color::NUM]>,
    /// 1手あたりの固定思考時間（ms）
    pub movetime: Option<TimePoint>,
    pub infinite: bool,
}

impl LimitsDescriptor {
    pub fn depth(depth: i32) -> Self {
        Self {
            depth: Some(depth),
            ..Self::default()
        }
    }

    /// 両手番の持ち時間を `ms` にする
    pub fn time(ms: TimePoint) -> Self {
        Self {
            time: Some([ms; Color::NUM]),
            ..Self::default()
        }
    }

    pub fn nodes(nodes: u64) -> Self {
        Self {
            nodes: Some(nodes),
            ..Self::default()
        }
    }

    pub fn movetime(ms: TimePoint) -> Self {
        Self {
            movetime: Some(ms),
            ..Self::default()
        }
    }

    pub fn infinite() -> Self {
        Self {
            infinite: true,
            ..Self::default()
        }
    }
}

impl From<&LimitsDescriptor> for LimitsType {
    fn from(desc: &LimitsDescriptor) -> Self {
        let mut limits = LimitsType::new();
        if let Some(depth) = desc.depth {
            limits.depth = depth;
        }
        if let Some(nodes) = desc.nodes {
            limits.nodes = nodes;
        }
        if let Some(time) = desc.time {
            limits.time = time;
        }
        if let Some(movetime) = desc.movetime {
            limits.movetime = movetime;
        }
        limits.infinite = desc.infinite;
        limits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_depth() {
        let limits = LimitsType::from(&LimitsDescriptor::depth(12));
        assert_eq!(limits.depth, 12);
        assert_eq!(limits.nodes, 0);
        assert!(!limits.infinite);
        assert!(!limits.use_time_management());
    }

    #[test]
    fn test_time_sets_both_sides() {
        let limits = LimitsType::from(&LimitsDescriptor::time(1500));
        assert_eq!(limits.time, [1500, 1500]);
        assert_eq!(limits.inc, [0, 0]);
        assert!(limits.use_time_management());
    }

    #[test]
    fn test_nodes_and_infinite() {
        let limits = LimitsType::from(&LimitsDescriptor::nodes(1 << 40));
        assert_eq!(limits.nodes, 1 << 40);
        assert!(LimitsType::from(&LimitsDescriptor::infinite()).infinite);
    }

    #[test]
    fn test_values_are_not_interpreted() {
        // 負の値もそのまま渡す
        let limits = LimitsType::from(&LimitsDescriptor::depth(-3));
        assert_eq!(limits.depth, -3);
        let limits = LimitsType::from(&LimitsDescriptor::movetime(250));
        assert_eq!(limits.movetime, 250);
        assert_eq!(limits.time, [0, 0]);
    }
}
