/// 揭示聚合器
///
/// 行程內所有光源 active 集的註冊表。每 tick 取一次聯集、跟上次
/// 套用的結果做差分，在預算內把增減寫進照亮圖層。明確物件、由
/// 嵌入端持有，不是躲在靜態變數後面的單例。
use hashbrown::{HashMap, HashSet};

use crate::reveal::grid::{CellPos, RevealGrid};

/// 預設的每 tick 格子寫入預算
pub const DEFAULT_APPLY_BUDGET: usize = 200;

/// 聚合器配發的光源編號
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SourceId(u32);

/// 聯集聚合與差分套用
#[derive(Debug, Clone)]
pub struct RevealAggregator {
    /// 各光源最近發佈的 active 集
    sets: HashMap<SourceId, HashSet<CellPos>>,
    /// 上次實際寫進照亮圖層的格子
    last_applied: HashSet<CellPos>,
    /// 已套用過的 tick，同一 tick 只套用一次
    applied_tick: Option<u64>,
    /// 每 tick 的格子寫入預算，所有光源共用
    apply_budget: usize,
    next_id: u32,
    // 重複使用的工作緩衝
    union_buf: HashSet<CellPos>,
    add_buf: Vec<CellPos>,
    del_buf: Vec<CellPos>,
}

impl Default for RevealAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_APPLY_BUDGET)
    }
}

impl RevealAggregator {
    pub fn new(apply_budget: usize) -> Self {
        Self {
            sets: HashMap::new(),
            last_applied: HashSet::new(),
            applied_tick: None,
            apply_budget,
            next_id: 0,
            union_buf: HashSet::new(),
            add_buf: Vec::new(),
            del_buf: Vec::new(),
        }
    }

    pub fn apply_budget(&self) -> usize {
        self.apply_budget
    }

    pub fn set_apply_budget(&mut self, budget: usize) {
        self.apply_budget = budget;
    }

    /// 登記一個新光源，回傳它的編號
    pub fn register(&mut self) -> SourceId {
        let id = SourceId(self.next_id);
        self.next_id += 1;
        self.sets.insert(id, HashSet::new());
        id
    }

    pub fn is_registered(&self, id: SourceId) -> bool {
        self.sets.contains_key(&id)
    }

    pub fn source_count(&self) -> usize {
        self.sets.len()
    }

    /// 發佈某光源本 tick 的 active 集
    pub fn publish(&mut self, id: SourceId, active: &HashSet<CellPos>) {
        match self.sets.get_mut(&id) {
            Some(set) => {
                set.clear();
                for &cell in active {
                    set.insert(cell);
                }
            }
            None => {
                debug_assert!(false, "publish for unregistered source {:?}", id);
            }
        }
    }

    /// 註銷光源並立即重算
    ///
    /// 不等下一個 tick 邊界，馬上把只剩這個光源在照的格子清掉，
    /// 不讓已消失的光源留下殘影。
    pub fn unregister(&mut self, id: SourceId, grid: &mut dyn RevealGrid) {
        if !self.remove_source(id) {
            return;
        }
        self.apply_now(grid);
    }

    /// 只移除登記，不重算。沒有網格可寫時的後路。
    pub fn remove_source(&mut self, id: SourceId) -> bool {
        self.sets.remove(&id).is_some()
    }

    /// 每 tick 套用一次聯集
    ///
    /// tick 編號由呼叫端明確傳入；同一 tick 不管被多少光源觸發，
    /// 實際套用只會發生一次。
    pub fn apply_once(&mut self, tick: u64, grid: &mut dyn RevealGrid) {
        if self.applied_tick == Some(tick) {
            return;
        }
        self.applied_tick = Some(tick);
        self.apply_now(grid);
    }

    /// 目前鏡射在照亮圖層上的格子
    pub fn last_applied(&self) -> &HashSet<CellPos> {
        &self.last_applied
    }

    /// 無條件重算聯集並套用差分
    ///
    /// 預算內寫多少記多少：`last_applied` 只收實際寫入的格子，
    /// 寫不完的差分下一個 tick 重新算進來，不會默默丟掉。
    fn apply_now(&mut self, grid: &mut dyn RevealGrid) {
        self.union_buf.clear();
        for set in self.sets.values() {
            for &cell in set {
                self.union_buf.insert(cell);
            }
        }

        self.add_buf.clear();
        self.del_buf.clear();
        for &cell in &self.union_buf {
            if !self.last_applied.contains(&cell) {
                self.add_buf.push(cell);
            }
        }
        for &cell in &self.last_applied {
            if !self.union_buf.contains(&cell) {
                self.del_buf.push(cell);
            }
        }

        let mut budget = self.apply_budget;
        let mut changed = false;

        for i in 0..self.add_buf.len() {
            if budget == 0 {
                break;
            }
            let cell = self.add_buf[i];
            let tile = match grid.tile_of(cell) {
                Some(tile) => tile,
                None => continue,
            };
            let color = grid.color_of(cell);
            grid.set_cell(cell, tile, color);
            self.last_applied.insert(cell);
            budget -= 1;
            changed = true;
        }

        for i in 0..self.del_buf.len() {
            if budget == 0 {
                break;
            }
            let cell = self.del_buf[i];
            grid.clear_cell(cell);
            self.last_applied.remove(&cell);
            budget -= 1;
            changed = true;
        }

        if changed {
            grid.notify_collision_rebuild();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reveal::grid::{MemoryTileGrid, TileId};
    use vek::{Rgba, Vec2};

    fn grid() -> MemoryTileGrid {
        let mut g = MemoryTileGrid::new(Vec2::zero(), Vec2::new(1.0, 1.0));
        g.fill_rect(
            CellPos::new(0, 0),
            CellPos::new(9, 9),
            TileId(1),
            Rgba::new(0.2, 0.4, 0.6, 1.0),
        );
        g
    }

    fn cells(list: &[(i32, i32)]) -> HashSet<CellPos> {
        list.iter().map(|&(x, y)| CellPos::new(x, y)).collect()
    }

    /// 同一 tick 重複呼叫只套用一次
    #[test]
    fn test_apply_once_per_tick() {
        let mut g = grid();
        let mut agg = RevealAggregator::new(DEFAULT_APPLY_BUDGET);
        let s1 = agg.register();
        agg.publish(s1, &cells(&[(1, 1), (2, 2)]));

        agg.apply_once(1, &mut g);
        assert_eq!(g.lit_count(), 2);
        assert_eq!(g.collision_rebuilds(), 1);

        // 第二次呼叫是 no-op，連差分都不重算
        agg.apply_once(1, &mut g);
        assert_eq!(g.collision_rebuilds(), 1);

        // 新 tick 沒有變化時重算差分但不寫格子
        agg.apply_once(2, &mut g);
        assert_eq!(g.collision_rebuilds(), 1, "沒有格子變動就不通知碰撞重建");
    }

    /// 聯集正確性：照亮圖層等於兩個光源 active 集的聯集
    #[test]
    fn test_union_of_two_sources() {
        let mut g = grid();
        let mut agg = RevealAggregator::new(DEFAULT_APPLY_BUDGET);
        let s1 = agg.register();
        let s2 = agg.register();
        agg.publish(s1, &cells(&[(0, 0), (1, 0)]));
        agg.publish(s2, &cells(&[(1, 0), (2, 0)]));

        agg.apply_once(1, &mut g);

        let lit: HashSet<CellPos> = g.lit_cells().into_iter().collect();
        assert_eq!(lit, cells(&[(0, 0), (1, 0), (2, 0)]));
        // 圖塊與顏色抄自來源圖層
        assert_eq!(
            g.lit_tile(CellPos::new(1, 0)),
            Some((TileId(1), Rgba::new(0.2, 0.4, 0.6, 1.0)))
        );
    }

    /// 註銷正確性：拿掉 S1 之後立刻只剩 S2 的格子
    #[test]
    fn test_unregister_clears_stale_cells() {
        let mut g = grid();
        let mut agg = RevealAggregator::new(DEFAULT_APPLY_BUDGET);
        let s1 = agg.register();
        let s2 = agg.register();
        agg.publish(s1, &cells(&[(0, 0), (1, 0)]));
        agg.publish(s2, &cells(&[(1, 0), (2, 0)]));
        agg.apply_once(1, &mut g);

        // 不等下一個 tick，註銷當下就要重算
        agg.unregister(s1, &mut g);

        let lit: HashSet<CellPos> = g.lit_cells().into_iter().collect();
        assert_eq!(lit, cells(&[(1, 0), (2, 0)]));
        assert!(!agg.is_registered(s1));
        assert_eq!(agg.source_count(), 1);
    }

    /// 預算上限：一次套用寫入的格子數不超過預算
    #[test]
    fn test_budget_bounds_writes() {
        let mut g = grid();
        let mut agg = RevealAggregator::new(3);
        let s1 = agg.register();
        let many: HashSet<CellPos> = (0..10).map(|x| CellPos::new(x, 0)).collect();
        agg.publish(s1, &many);

        agg.apply_once(1, &mut g);
        assert_eq!(g.lit_count(), 3, "一次套用最多寫預算數量的格子");
    }

    /// 預算用罄時的遞延：沒寫到的差分後續 tick 補上，不會丟失
    #[test]
    fn test_deferred_diffs_catch_up() {
        let mut g = grid();
        let mut agg = RevealAggregator::new(3);
        let s1 = agg.register();
        let many: HashSet<CellPos> = (0..10).map(|x| CellPos::new(x, 0)).collect();
        agg.publish(s1, &many);

        for (tick, expect) in [(1u64, 3usize), (2, 6), (3, 9), (4, 10), (5, 10)] {
            agg.apply_once(tick, &mut g);
            assert_eq!(g.lit_count(), expect, "tick {} 後應該點亮 {} 格", tick, expect);
        }

        // 移除同樣受預算管制、同樣會補完
        agg.publish(s1, &cells(&[]));
        for (tick, expect) in [(6u64, 7usize), (7, 4), (8, 1), (9, 0)] {
            agg.apply_once(tick, &mut g);
            assert_eq!(g.lit_count(), expect);
        }
    }

    /// 來源圖層沒有圖塊的格子不寫入也不佔預算
    #[test]
    fn test_missing_source_tile_is_skipped() {
        let mut g = grid();
        let mut agg = RevealAggregator::new(DEFAULT_APPLY_BUDGET);
        let s1 = agg.register();
        // (50,50) 不在來源圖層
        agg.publish(s1, &cells(&[(50, 50), (1, 1)]));

        agg.apply_once(1, &mut g);
        let lit: HashSet<CellPos> = g.lit_cells().into_iter().collect();
        assert_eq!(lit, cells(&[(1, 1)]));
    }

    /// 空聚合器套用不做事
    #[test]
    fn test_empty_aggregator_is_noop() {
        let mut g = grid();
        let mut agg = RevealAggregator::default();
        agg.apply_once(1, &mut g);
        assert_eq!(g.lit_count(), 0);
        assert_eq!(g.collision_rebuilds(), 0);
    }
}
