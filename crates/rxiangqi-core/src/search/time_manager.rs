//! 思考時間の管理
//!
//! 残り時間から目安時間（optimum）と上限時間（maximum）を決める。

use super::limits::{LimitsType, TimePoint};
use crate::types::Color;

/// 残り手数の見積もり
const MOVES_TO_GO: TimePoint = 30;

/// 時間管理
#[derive(Clone, Debug, Default)]
pub struct TimeManagement {
    optimum: TimePoint,
    maximum: TimePoint,
    /// 時間で止めるか（movetime または時間制御あり）
    enabled: bool,
}

impl TimeManagement {
    /// 探索開始時に制限条件から時間配分を決める
    pub fn init(limits: &LimitsType, us: Color, move_overhead: TimePoint) -> Self {
        if limits.has_movetime() {
            let t = (limits.movetime - move_overhead).max(1);
            return Self {
                optimum: t,
                maximum: t,
                enabled: true,
            };
        }
        if !limits.use_time_management() {
            return Self::default();
        }

        let time_left = (limits.time_left(us) - move_overhead).max(1);
        let inc = limits.increment(us);
        let optimum = (time_left / MOVES_TO_GO + inc * 3 / 4).clamp(1, time_left);
        let maximum = (optimum * 5).min(time_left * 8 / 10).max(optimum);
        Self {
            optimum,
            maximum,
            enabled: true,
        }
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// 反復深化を打ち切る目安時間
    #[inline]
    pub fn optimum(&self) -> TimePoint {
        self.optimum
    }

    /// 探索を中断する上限時間
    #[inline]
    pub fn maximum(&self) -> TimePoint {
        self.maximum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_for_fixed_limits() {
        let mut limits = LimitsType::new();
        limits.depth = 5;
        assert!(!TimeManagement::init(&limits, Color::Red, 10).enabled());
        let limits = LimitsType::new();
        assert!(!TimeManagement::init(&limits, Color::Red, 10).enabled());
    }

    #[test]
    fn test_movetime() {
        let mut limits = LimitsType::new();
        limits.movetime = 1000;
        let tm = TimeManagement::init(&limits, Color::Black, 10);
        assert!(tm.enabled());
        assert_eq!(tm.optimum(), 990);
        assert_eq!(tm.maximum(), 990);
    }

    #[test]
    fn test_clock_allocation() {
        let mut limits = LimitsType::new();
        limits.time = [60_000, 1_000];
        let red = TimeManagement::init(&limits, Color::Red, 10);
        let black = TimeManagement::init(&limits, Color::Black, 10);
        assert!(red.optimum() > black.optimum());
        assert!(red.optimum() <= red.maximum());
        assert!(red.maximum() < 60_000);
        assert!(black.maximum() <= 990);
    }
}
