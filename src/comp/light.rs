/// 光錐組件
///
/// 一個實體一個錐形光源：生成時的靜態規格，加上掃描緩衝、
/// 殘光追蹤等逐 tick 狀態。
use hashbrown::HashSet;
use rand::Rng;
use serde::{Deserialize, Serialize};
use specs::storage::VecStorage;
use specs::Component;

use crate::reveal::aggregator::SourceId;
use crate::reveal::flicker::JitterMode;
use crate::reveal::grid::CellPos;
use crate::reveal::linger::LingerTracker;
use crate::reveal::occlusion::OccluderMask;

/// 光錐規格
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LightParams {
    /// 照射距離
    pub range: f32,
    /// 半開角（度，0..180）
    pub half_angle_deg: f32,
    /// 哪些遮擋層會擋住這道光
    pub occluder_mask: OccluderMask,
    /// 每格視線取樣數（1..=5：中心加四個角點）
    pub los_samples: u8,
    /// 閃爍頻率（Hz，0 表示常亮）
    pub flicker_hz: f32,
    /// 週期內點亮的比例（0..1）
    pub flicker_duty: f32,
    /// 週期抖動幅度（0..1）
    pub flicker_jitter: f32,
    /// 抖動取樣模式
    pub jitter_mode: JitterMode,
    /// 格子離開光束後保持點亮的秒數（0 表示無殘光）
    pub linger_seconds: f32,
}

impl Default for LightParams {
    fn default() -> Self {
        Self {
            range: 12.0,
            half_angle_deg: 35.0,
            occluder_mask: OccluderMask::NONE,
            los_samples: 1,
            flicker_hz: 0.0,
            flicker_duty: 0.5,
            flicker_jitter: 0.0,
            jitter_mode: JitterMode::FixedAtSpawn,
            linger_seconds: 0.2,
        }
    }
}

/// 光錐組件：規格加上逐 tick 狀態
#[derive(Clone, Debug)]
pub struct LightCone {
    pub params: LightParams,
    /// 閃爍相位，生成時隨機指定，生命期內固定，
    /// 讓同地點的光源不會同步明滅
    pub phase: f32,
    /// 固定抖動取樣（FixedAtSpawn 模式使用）
    pub jitter_sample: f32,
    /// 聚合器配發的來源編號，首次 tick 時登記
    pub source_id: Option<SourceId>,
    /// 本 tick 光束是否點亮（閃爍判定結果）
    pub beam_on: bool,
    /// 本 tick 的掃描結果，重複使用的緩衝
    pub scan: HashSet<CellPos>,
    /// 殘光追蹤
    pub linger: LingerTracker,
    /// 發佈給聚合器的 active 集，重複使用的緩衝
    pub active: HashSet<CellPos>,
}

impl Component for LightCone {
    type Storage = VecStorage<Self>;
}

impl LightCone {
    /// 依規格建立光源
    ///
    /// 超界的設定值一律夾住而不是拒絕；相位與固定抖動取樣在這裡
    /// 抽一次，之後不變。
    pub fn spawn(params: LightParams, rng: &mut impl Rng) -> Self {
        let mut params = params;
        params.range = params.range.max(0.0);
        params.half_angle_deg = params.half_angle_deg.clamp(0.0, 180.0);
        params.los_samples = params.los_samples.clamp(1, 5);
        params.flicker_duty = params.flicker_duty.clamp(0.0, 1.0);
        params.flicker_jitter = params.flicker_jitter.clamp(0.0, 1.0);
        params.linger_seconds = params.linger_seconds.max(0.0);

        let phase = rng.random::<f32>() * 10.0;
        let j = params.flicker_jitter;
        let jitter_sample = if j > 0.0 {
            rng.random_range(-j..=j)
        } else {
            0.0
        };

        Self {
            params,
            phase,
            jitter_sample,
            source_id: None,
            beam_on: false,
            scan: HashSet::new(),
            linger: LingerTracker::new(),
            active: HashSet::new(),
        }
    }

    /// 視覺上是否該亮著：光束點亮，或仍有殘光格子沒熄
    pub fn is_visually_on(&self) -> bool {
        self.beam_on || self.linger.has_active()
    }
}

/// 發光外觀的形狀參數化
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum GlowShape {
    /// 錐形外觀：半徑與全開角（度），可跟光錐同步
    Cone { radius: f32, arc_deg: f32 },
    /// 自由形狀，忽略半徑與角度同步
    Freeform,
}

/// 與光錐同步的發光外觀
///
/// 只消費光錐發佈的亮/殘光狀態做強度過渡，從不回寫網格。
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GlowLight {
    /// 點亮時的目標強度
    pub on_intensity: f32,
    /// 熄滅時的目標強度
    pub off_intensity: f32,
    /// 每秒的強度插值速率
    pub lerp_speed: f32,
    /// 當前顯示強度
    pub intensity: f32,
    /// 是否把光錐的 range/開角複製到外觀形狀
    pub sync_shape: bool,
    pub shape: GlowShape,
}

impl Default for GlowLight {
    fn default() -> Self {
        Self {
            on_intensity: 1.5,
            off_intensity: 0.0,
            lerp_speed: 12.0,
            intensity: 0.0,
            sync_shape: true,
            shape: GlowShape::Cone {
                radius: 0.0,
                arc_deg: 0.0,
            },
        }
    }
}

impl Component for GlowLight {
    type Storage = VecStorage<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg64Mcg;

    /// 超界設定值被夾住而不是拒絕
    #[test]
    fn test_spawn_clamps_config() {
        let mut rng = Pcg64Mcg::seed_from_u64(1);
        let cone = LightCone::spawn(
            LightParams {
                range: -5.0,
                half_angle_deg: 400.0,
                los_samples: 9,
                flicker_duty: 3.0,
                flicker_jitter: -0.5,
                linger_seconds: -1.0,
                ..LightParams::default()
            },
            &mut rng,
        );

        assert_eq!(cone.params.range, 0.0);
        assert_eq!(cone.params.half_angle_deg, 180.0);
        assert_eq!(cone.params.los_samples, 5);
        assert_eq!(cone.params.flicker_duty, 1.0);
        assert_eq!(cone.params.flicker_jitter, 0.0);
        assert_eq!(cone.params.linger_seconds, 0.0);
        assert_eq!(cone.jitter_sample, 0.0, "抖動為 0 時取樣也是 0");
    }

    /// 相位與抖動取樣由 rng 決定，種子相同就可重現
    #[test]
    fn test_spawn_is_reproducible() {
        let params = LightParams {
            flicker_jitter: 0.3,
            ..LightParams::default()
        };
        let a = LightCone::spawn(params.clone(), &mut Pcg64Mcg::seed_from_u64(42));
        let b = LightCone::spawn(params, &mut Pcg64Mcg::seed_from_u64(42));

        assert_eq!(a.phase, b.phase);
        assert_eq!(a.jitter_sample, b.jitter_sample);
        assert!(a.phase >= 0.0 && a.phase < 10.0);
        assert!(a.jitter_sample >= -0.3 && a.jitter_sample <= 0.3);
    }
}
