/// 殘光追蹤
///
/// 格子離開光束後不會立刻熄滅，而是保留一段寬限時間。
/// 每個光源各自維護 cell → 到期時間 的對照表。
use hashbrown::{HashMap, HashSet};

use crate::reveal::grid::CellPos;

/// 單一光源的殘光狀態
#[derive(Debug, Clone, Default)]
pub struct LingerTracker {
    /// cell → 到期時間（絕對秒數）
    expiry: HashMap<CellPos, f64>,
    /// 到期項目的回收緩衝，避免每 tick 重新配置
    retire_buf: Vec<CellPos>,
}

impl LingerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以本 tick 的掃描結果更新到期表
    ///
    /// 寬限大於 0：掃到的格子刷新成 `now + linger`，之後淘汰所有
    /// `expiry <= now` 的項目，格子恰好活在 `[t0, t0 + linger)`。
    /// 寬限為 0：到期表退化成「本 tick 掃到的集合」。
    /// 光束熄滅的 tick 掃描集是空的，殘光格子照舊各自倒數。
    pub fn update(&mut self, scan: &HashSet<CellPos>, now: f64, linger_seconds: f32) {
        if linger_seconds > 0.0 {
            for &cell in scan {
                self.expiry.insert(cell, now + linger_seconds as f64);
            }
            self.retire_buf.clear();
            for (&cell, &until) in &self.expiry {
                if until <= now {
                    self.retire_buf.push(cell);
                }
            }
            for i in 0..self.retire_buf.len() {
                self.expiry.remove(&self.retire_buf[i]);
            }
        } else {
            self.expiry.clear();
            for &cell in scan {
                self.expiry.insert(cell, now);
            }
        }
    }

    /// 還有沒有活著的格子
    pub fn has_active(&self) -> bool {
        !self.expiry.is_empty()
    }

    pub fn active_len(&self) -> usize {
        self.expiry.len()
    }

    pub fn is_active(&self, cell: CellPos) -> bool {
        self.expiry.contains_key(&cell)
    }

    /// 把現存鍵集複製進呼叫端重複使用的緩衝
    pub fn collect_active(&self, out: &mut HashSet<CellPos>) {
        out.clear();
        for &cell in self.expiry.keys() {
            out.insert(cell);
        }
    }

    pub fn clear(&mut self) {
        self.expiry.clear();
    }
}
