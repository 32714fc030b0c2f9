/// 光錐掃描
///
/// 每 tick 對點亮中的光源算出「此刻被照到」的格子集合。
/// 粗篩用邊長 2*range 的方形圈出候選範圍，細篩再過距離、
/// 夾角、遮擋三道條件，絕不做全網格掃描。
use hashbrown::HashSet;
use vek::Vec2;

use crate::reveal::grid::{CellPos, RevealGrid};
use crate::reveal::occlusion::{is_visible_multi, OccluderMask, RayCaster};

/// 夾角比較的容差（度）。錐緣上的格子要算在內，不能被浮點誤差踢掉。
const ANGLE_EPSILON: f32 = 1e-3;

/// 掃描單一光錐，結果寫進呼叫端重複使用的緩衝
///
/// 距離與夾角都採含邊界的比較，剛好落在 range 或 half_angle 上的
/// 格子算照到，避免錐緣抖動。朝向向量退化（長度趨近 0）時退回
/// +X 方向。
pub fn scan_cone(
    grid: &dyn RevealGrid,
    caster: &dyn RayCaster,
    origin: Vec2<f32>,
    facing: Vec2<f32>,
    range: f32,
    half_angle_deg: f32,
    mask: OccluderMask,
    los_samples: u8,
    out: &mut HashSet<CellPos>,
) {
    out.clear();

    let range = range.max(0.0);
    let half = half_angle_deg.clamp(0.0, 180.0);
    let fwd = if facing.magnitude_squared() > 1e-8 {
        facing.normalized()
    } else {
        Vec2::unit_x()
    };

    // 粗篩：光源為中心、邊長 2r 的方形蓋到的格子範圍
    let r = range.max(0.1);
    let cmin = grid.world_to_cell(origin - Vec2::new(r, r));
    let cmax = grid.world_to_cell(origin + Vec2::new(r, r));
    let (x0, x1) = if cmax.x < cmin.x {
        (cmax.x, cmin.x)
    } else {
        (cmin.x, cmax.x)
    };
    let (y0, y1) = if cmax.y < cmin.y {
        (cmax.y, cmin.y)
    } else {
        (cmin.y, cmax.y)
    };

    let half_extent = grid.cell_half_extent();

    for y in y0..=y1 {
        for x in x0..=x1 {
            let cell = CellPos::new(x, y);
            if !grid.has_cell(cell) {
                continue;
            }

            let center = grid.cell_center(cell);
            let to = center - origin;

            if to.magnitude() > range {
                continue;
            }
            if angle_between_deg(fwd, to) > half + ANGLE_EPSILON {
                continue;
            }
            if !is_visible_multi(caster, origin, center, half_extent, mask, los_samples) {
                continue;
            }

            out.insert(cell);
        }
    }
}

/// 單位向量與任意向量之間的無號夾角（度）
///
/// 零向量視為正前方，光源所在的格子不會被角度條件踢掉。
fn angle_between_deg(unit_fwd: Vec2<f32>, to: Vec2<f32>) -> f32 {
    let len = to.magnitude();
    if len <= 1e-6 {
        return 0.0;
    }
    let cos = (unit_fwd.dot(to) / len).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}
