//! 探索制限（LimitsType）
//!
//! UCI `go` コマンドのパラメータを表現する。

use crate::time::Instant;
use crate::types::Color;

// =============================================================================
// TimePoint
// =============================================================================

/// 時間（ミリ秒）
pub type TimePoint = i64;

// =============================================================================
// LimitsType
// =============================================================================

/// 探索制限条件
#[derive(Clone, Debug, Default)]
pub struct LimitsType {
    /// 両者の残り時間（ミリ秒）
    pub time: [TimePoint; Color::NUM],

    /// フィッシャールール：1手ごとの時間増加（ミリ秒）
    pub inc: [TimePoint; Color::NUM],

    /// 思考時間固定（ミリ秒、0以外なら有効）
    pub movetime: TimePoint,

    /// 探索深さ固定（0以外なら有効）
    pub depth: i32,

    /// 探索ノード数制限（0以外なら有効）
    pub nodes: u64,

    /// 思考時間無制限フラグ（stop まで bestmove を返さない）
    pub infinite: bool,

    /// 探索開始時刻
    pub(crate) start_time: Option<Instant>,
}

impl LimitsType {
    /// 新しいLimitsTypeを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 時間制御を行うべきかの判定
    ///
    /// movetime / depth / nodes / infinite のいずれかが指定されている場合は行わない。
    /// 残り時間が両者とも 0 の場合も行わない（無制限扱い）。
    #[inline]
    pub fn use_time_management(&self) -> bool {
        self.movetime == 0
            && self.depth == 0
            && self.nodes == 0
            && !self.infinite
            && self.time.iter().any(|&t| t > 0)
    }

    /// 探索開始時刻を設定
    pub fn set_start_time(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// 探索開始からの経過時間（ミリ秒）
    pub fn elapsed(&self) -> TimePoint {
        self.start_time
            .map(|t| t.elapsed().as_millis() as TimePoint)
            .unwrap_or(0)
    }

    /// 指定した色の残り時間を取得
    #[inline]
    pub fn time_left(&self, color: Color) -> TimePoint {
        self.time[color.index()]
    }

    /// 指定した色のインクリメント時間を取得
    #[inline]
    pub fn increment(&self, color: Color) -> TimePoint {
        self.inc[color.index()]
    }

    /// 深さ制限があるか
    #[inline]
    pub fn has_depth_limit(&self) -> bool {
        self.depth > 0
    }

    /// ノード数制限があるか
    #[inline]
    pub fn has_nodes_limit(&self) -> bool {
        self.nodes > 0
    }

    /// 思考時間が固定されているか
    #[inline]
    pub fn has_movetime(&self) -> bool {
        self.movetime > 0
    }
}

// =============================================================================
// テスト
// =============================================================================
