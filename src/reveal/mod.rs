/// 照亮系統核心模組
///
/// 包含網格存取、遮擋測試、閃爍時鐘、光錐掃描、殘光追蹤與
/// 聯集聚合等非 ECS 組件
pub mod aggregator;
pub mod cone_scan;
pub mod flicker;
pub mod grid;
pub mod linger;
pub mod occlusion;

pub use self::{
    aggregator::{RevealAggregator, SourceId, DEFAULT_APPLY_BUDGET},
    cone_scan::scan_cone,
    flicker::{beam_is_on, JitterMode},
    grid::{CellPos, MemoryTileGrid, RevealGrid, TileId},
    linger::LingerTracker,
    occlusion::{is_visible, is_visible_multi, OccluderMap, OccluderMask, OccluderSegment, RayCaster},
};
