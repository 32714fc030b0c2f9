/// 遮擋測試
///
/// 在光源與目標點之間做射線取樣，判斷視線是否被擋住。
/// 射線基元由外部空間查詢供應者實作。
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use vek::Vec2;

/// 與光源重合的目標視為永遠可見的距離門檻
const CONTACT_DISTANCE: f32 = 1e-3;

/// 遮擋層位元遮罩
///
/// 每個遮擋物屬於一層（0..32），遮罩挑出哪些層會擋光。
/// 遮罩為 0 時什麼都不擋。
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OccluderMask(pub u32);

impl OccluderMask {
    pub const NONE: Self = OccluderMask(0);
    pub const ALL: Self = OccluderMask(u32::MAX);

    pub fn single(layer: u8) -> Self {
        OccluderMask(1u32 << (layer as u32 & 31))
    }

    pub fn contains(&self, layer: u8) -> bool {
        self.0 & (1u32 << (layer as u32 & 31)) != 0
    }
}

/// 射線投射介面
pub trait RayCaster {
    /// 從 origin 沿 dir（單位向量）投射，在 max_distance 內撞到
    /// 遮罩挑中的遮擋物時回傳 true
    fn cast(&self, origin: Vec2<f32>, dir: Vec2<f32>, max_distance: f32, mask: OccluderMask) -> bool;
}

/// 線段遮擋物
#[derive(Debug, Clone, PartialEq)]
pub struct OccluderSegment {
    pub a: Vec2<f32>,
    pub b: Vec2<f32>,
    pub layer: u8,
}

/// 以命名線段組成的遮擋世界
///
/// 供測試與示範程式使用的內建 `RayCaster` 實作；嵌入端可以改掛
/// 自己的空間查詢。
#[derive(Debug, Clone, Default)]
pub struct OccluderMap {
    segments: HashMap<String, OccluderSegment>,
}

impl OccluderMap {
    pub fn new() -> Self {
        Self {
            segments: HashMap::new(),
        }
    }

    /// 加入（或覆蓋）一條遮擋線段
    pub fn add_segment(&mut self, name: &str, a: Vec2<f32>, b: Vec2<f32>, layer: u8) {
        self.segments
            .insert(name.to_string(), OccluderSegment { a, b, layer });
    }

    /// 移除遮擋線段，回傳是否存在
    pub fn remove_segment(&mut self, name: &str) -> bool {
        self.segments.remove(name).is_some()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// 射線與線段相交檢測，回傳沿射線的距離
    fn ray_segment_intersection(
        ray_origin: Vec2<f32>,
        ray_direction: Vec2<f32>,
        line_start: Vec2<f32>,
        line_end: Vec2<f32>,
    ) -> Option<f32> {
        let line_direction = line_end - line_start;
        let cross = ray_direction.x * line_direction.y - ray_direction.y * line_direction.x;

        if cross.abs() < 1e-6 {
            return None;
        }

        let to_line_start = line_start - ray_origin;
        let t = (to_line_start.x * line_direction.y - to_line_start.y * line_direction.x) / cross;
        let u = (to_line_start.x * ray_direction.y - to_line_start.y * ray_direction.x) / cross;

        if t >= 0.0 && u >= 0.0 && u <= 1.0 {
            Some(t)
        } else {
            None
        }
    }
}

impl RayCaster for OccluderMap {
    fn cast(&self, origin: Vec2<f32>, dir: Vec2<f32>, max_distance: f32, mask: OccluderMask) -> bool {
        if mask == OccluderMask::NONE {
            return false;
        }
        for seg in self.segments.values() {
            if !mask.contains(seg.layer) {
                continue;
            }
            if let Some(t) = Self::ray_segment_intersection(origin, dir, seg.a, seg.b) {
                if t <= max_distance {
                    return true;
                }
            }
        }
        false
    }
}

/// 單點視線測試：從 origin 朝 target 投射一條射線，沒撞到遮擋物
/// 即為可見。與光源重合的目標永遠可見。
pub fn is_visible(
    caster: &dyn RayCaster,
    origin: Vec2<f32>,
    target: Vec2<f32>,
    max_distance: f32,
    mask: OccluderMask,
) -> bool {
    let to = target - origin;
    let dist = to.magnitude();
    if dist <= CONTACT_DISTANCE {
        return true;
    }
    !caster.cast(origin, to / dist, dist.min(max_distance), mask)
}

/// 多點視線測試：先測格子中心，被擋住時再測最多 sample_count - 1
/// 個角點（±半格偏移），任一取樣點通過即視為可見。
///
/// 中心射線剛好擦過遮擋物邊緣、角落其實看得到的格子，用角點取樣
/// 換回來。
pub fn is_visible_multi(
    caster: &dyn RayCaster,
    origin: Vec2<f32>,
    cell_center: Vec2<f32>,
    cell_half_extent: Vec2<f32>,
    mask: OccluderMask,
    sample_count: u8,
) -> bool {
    if is_visible(caster, origin, cell_center, f32::INFINITY, mask) {
        return true;
    }
    if sample_count <= 1 {
        return false;
    }

    let h = cell_half_extent;
    let corners = [
        Vec2::new(cell_center.x - h.x, cell_center.y - h.y),
        Vec2::new(cell_center.x + h.x, cell_center.y - h.y),
        Vec2::new(cell_center.x - h.x, cell_center.y + h.y),
        Vec2::new(cell_center.x + h.x, cell_center.y + h.y),
    ];
    let samples = ((sample_count - 1) as usize).min(corners.len());
    for corner in corners.iter().take(samples) {
        if is_visible(caster, origin, *corner, f32::INFINITY, mask) {
            return true;
        }
    }
    false
}
