/// 網格存取層
///
/// 對來源圖層提供唯讀查詢，對照亮圖層提供寫入介面。
/// 來源圖層永遠不會被本系統改動。
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use vek::{Rgba, Vec2};

/// 網格座標
#[derive(Copy, Clone, Default, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellPos {
    pub x: i32,
    pub y: i32,
}

impl CellPos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// 圖塊識別碼，對本系統而言不透明
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileId(pub u32);

/// 網格供應者介面
///
/// 查詢面向來源圖層，寫入面向照亮圖層。超出後備儲存範圍的座標
/// 一律視為「不存在」，不得失敗。
pub trait RevealGrid {
    /// 來源圖層在該格是否有圖塊
    fn has_cell(&self, cell: CellPos) -> bool;
    /// 該格中心的世界座標
    fn cell_center(&self, cell: CellPos) -> Vec2<f32>;
    /// 世界座標換算成網格座標
    fn world_to_cell(&self, world: Vec2<f32>) -> CellPos;
    /// 半格大小，LOS 角點取樣用
    fn cell_half_extent(&self) -> Vec2<f32>;
    /// 來源圖層的圖塊
    fn tile_of(&self, cell: CellPos) -> Option<TileId>;
    /// 來源圖層的顏色；沒有圖塊時回傳白色
    fn color_of(&self, cell: CellPos) -> Rgba<f32>;
    /// 寫入照亮圖層
    fn set_cell(&mut self, cell: CellPos, tile: TileId, color: Rgba<f32>);
    /// 清除照亮圖層的一格
    fn clear_cell(&mut self, cell: CellPos);
    /// 照亮圖層變動後的碰撞重建通知，射後不理
    fn notify_collision_rebuild(&mut self);
}

/// 記憶體網格
///
/// 供測試與示範程式使用的內建網格供應者。嵌入端可以改掛自己的
/// `RevealGrid` 實作。
#[derive(Debug, Clone)]
pub struct MemoryTileGrid {
    /// 網格原點（(0,0) 格左下角的世界座標）
    origin: Vec2<f32>,
    /// 每格的物理大小
    cell_size: Vec2<f32>,
    /// 來源圖層
    source: HashMap<CellPos, (TileId, Rgba<f32>)>,
    /// 照亮圖層
    lit: HashMap<CellPos, (TileId, Rgba<f32>)>,
    /// 碰撞重建次數
    collision_rebuilds: u64,
}

impl MemoryTileGrid {
    pub fn new(origin: Vec2<f32>, cell_size: Vec2<f32>) -> Self {
        Self {
            origin,
            cell_size,
            source: HashMap::new(),
            lit: HashMap::new(),
            collision_rebuilds: 0,
        }
    }

    /// 在來源圖層放一個圖塊
    pub fn insert_source_tile(&mut self, cell: CellPos, tile: TileId, color: Rgba<f32>) {
        self.source.insert(cell, (tile, color));
    }

    /// 在來源圖層填滿一塊矩形區域（含邊界）
    pub fn fill_rect(&mut self, min: CellPos, max: CellPos, tile: TileId, color: Rgba<f32>) {
        for y in min.y..=max.y {
            for x in min.x..=max.x {
                self.source.insert(CellPos::new(x, y), (tile, color));
            }
        }
    }

    /// 照亮圖層目前的非空格子
    pub fn lit_cells(&self) -> Vec<CellPos> {
        self.lit.keys().copied().collect()
    }

    /// 照亮圖層某格的內容
    pub fn lit_tile(&self, cell: CellPos) -> Option<(TileId, Rgba<f32>)> {
        self.lit.get(&cell).copied()
    }

    pub fn lit_count(&self) -> usize {
        self.lit.len()
    }

    pub fn source_count(&self) -> usize {
        self.source.len()
    }

    /// 至今收到的碰撞重建通知次數
    pub fn collision_rebuilds(&self) -> u64 {
        self.collision_rebuilds
    }
}

impl RevealGrid for MemoryTileGrid {
    fn has_cell(&self, cell: CellPos) -> bool {
        self.source.contains_key(&cell)
    }

    fn cell_center(&self, cell: CellPos) -> Vec2<f32> {
        self.origin
            + Vec2::new(
                (cell.x as f32 + 0.5) * self.cell_size.x,
                (cell.y as f32 + 0.5) * self.cell_size.y,
            )
    }

    fn world_to_cell(&self, world: Vec2<f32>) -> CellPos {
        let local = world - self.origin;
        CellPos::new(
            (local.x / self.cell_size.x).floor() as i32,
            (local.y / self.cell_size.y).floor() as i32,
        )
    }

    fn cell_half_extent(&self) -> Vec2<f32> {
        self.cell_size * 0.5
    }

    fn tile_of(&self, cell: CellPos) -> Option<TileId> {
        self.source.get(&cell).map(|(tile, _)| *tile)
    }

    fn color_of(&self, cell: CellPos) -> Rgba<f32> {
        self.source
            .get(&cell)
            .map(|(_, color)| *color)
            .unwrap_or(Rgba::white())
    }

    fn set_cell(&mut self, cell: CellPos, tile: TileId, color: Rgba<f32>) {
        self.lit.insert(cell, (tile, color));
    }

    fn clear_cell(&mut self, cell: CellPos) {
        self.lit.remove(&cell);
    }

    fn notify_collision_rebuild(&mut self) {
        self.collision_rebuilds += 1;
    }
}
