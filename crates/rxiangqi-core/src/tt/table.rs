//! TranspositionTable本体
//!
//! - Cluster: 同一インデックスのエントリ群
//! - probe/store 操作
//! - 世代管理と使用率（hashfull）

use std::sync::atomic::{AtomicU8, Ordering};

use super::entry::{Bound, TTData, TTEntry, generation_of, pack, unpack};
use crate::types::{Depth, Move, Value};

/// 1クラスターのエントリ数
pub const CLUSTER_SIZE: usize = 4;

/// 世代は6bitで循環する
const GENERATION_MASK: u8 = 0x3F;

/// クラスター（64バイト）
#[repr(C, align(64))]
#[derive(Default)]
struct Cluster {
    entries: [TTEntry; CLUSTER_SIZE],
}

const _: () = assert!(std::mem::size_of::<Cluster>() == 64);

/// 置換表
pub struct TranspositionTable {
    table: Box<[Cluster]>,
    /// 世代カウンター
    generation: AtomicU8,
    /// 実際に確保したサイズ（MB）
    size_mb: usize,
}

impl TranspositionTable {
    /// 新しい置換表を作成（サイズはMB単位）
    ///
    /// 確保に失敗した場合は最小サイズ（1MB）で作成する。
    pub fn new(mb_size: usize) -> Self {
        Self::try_new(mb_size).unwrap_or_else(|| {
            log::warn!("failed to allocate {mb_size}MB transposition table, falling back to 1MB");
            Self {
                table: (0..cluster_count_for(1)).map(|_| Cluster::default()).collect(),
                generation: AtomicU8::new(0),
                size_mb: 1,
            }
        })
    }

    /// 新しい置換表を作成（確保失敗時は None）
    pub fn try_new(mb_size: usize) -> Option<Self> {
        let mb_size = mb_size.max(1);
        let count = cluster_count_for(mb_size);
        let mut table = Vec::new();
        table.try_reserve_exact(count).ok()?;
        table.extend((0..count).map(|_| Cluster::default()));
        Some(Self {
            table: table.into_boxed_slice(),
            generation: AtomicU8::new(0),
            size_mb: mb_size,
        })
    }

    /// 確保済みのサイズ（MB）
    #[inline]
    pub fn size_mb(&self) -> usize {
        self.size_mb
    }

    /// エントリ総数
    #[inline]
    pub fn entry_count(&self) -> usize {
        self.table.len() * CLUSTER_SIZE
    }

    /// 全エントリを消去し、世代を0に戻す
    pub fn clear(&self) {
        self.generation.store(0, Ordering::Relaxed);
        for cluster in self.table.iter() {
            for entry in &cluster.entries {
                entry.reset();
            }
        }
    }

    /// 新しい探索を開始（世代を進める）
    pub fn new_search(&self) {
        let next = (self.generation() + 1) & GENERATION_MASK;
        self.generation.store(next, Ordering::Relaxed);
    }

    #[inline]
    pub fn generation(&self) -> u8 {
        self.generation.load(Ordering::Relaxed)
    }

    #[inline]
    fn cluster(&self, key: u64) -> &Cluster {
        // key * len / 2^64
        let index = ((key as u128 * self.table.len() as u128) >> 64) as usize;
        &self.table[index]
    }

    /// 置換表を検索
    pub fn probe(&self, key: u64) -> Option<TTData> {
        self.cluster(key).entries.iter().find_map(|entry| {
            let (k, data) = entry.load();
            (data != 0 && k == key).then(|| unpack(data))
        })
    }

    /// 置換表に書き込む
    ///
    /// 同じキーのエントリがあれば上書きし、なければ深さと世代から最も価値の低いエントリを置き換える。
    /// 指し手が無い場合は既存の指し手を保持する。
    pub fn store(&self, key: u64, value: Value, bound: Bound, depth: Depth, mv: Move, eval: Value) {
        let generation = self.generation();
        let cluster = self.cluster(key);

        let mut replace = &cluster.entries[0];
        let mut replace_score = i32::MAX;
        for entry in &cluster.entries {
            let (k, data) = entry.load();
            if data == 0 || k == key {
                replace = entry;
                if k == key && data != 0 {
                    let old = unpack(data);
                    // 浅い探索結果で深い Exact を潰さない
                    if bound != Bound::Exact
                        && depth + 4 < old.depth
                        && generation_of(data) == generation
                    {
                        return;
                    }
                    let mv = if mv.is_none() { old.mv } else { mv };
                    let new = TTData {
                        mv,
                        value,
                        eval,
                        depth,
                        bound,
                    };
                    entry.save(key, pack(&new, generation));
                    return;
                }
                break;
            }
            let old = unpack(data);
            let age = (generation.wrapping_sub(generation_of(data)) & GENERATION_MASK) as i32;
            let score = old.depth - age * 8;
            if score < replace_score {
                replace_score = score;
                replace = entry;
            }
        }

        let new = TTData {
            mv,
            value,
            eval,
            depth,
            bound,
        };
        replace.save(key, pack(&new, generation));
    }

    /// 使用率（1000分率）
    ///
    /// 先頭 1000 エントリのうち、現在の世代で書き込まれたものを数える。
    pub fn hashfull(&self) -> u32 {
        let generation = self.generation();
        let sample = 1000.min(self.entry_count());
        let used = self
            .table
            .iter()
            .flat_map(|c| c.entries.iter())
            .take(sample)
            .filter(|e| {
                let (_, data) = e.load();
                data != 0 && generation_of(data) == generation
            })
            .count();
        (used * 1000 / sample) as u32
    }
}

fn cluster_count_for(mb_size: usize) -> usize {
    (mb_size.saturating_mul(1024 * 1024) / std::mem::size_of::<Cluster>()).max(1)
}
