/// 閃爍時鐘
///
/// 每個光源依全域時間、個別相位、頻率、點亮比例與週期抖動，
/// 決定當下光束是亮還是暗。純函數，不帶任何隱藏狀態。
use serde::{Deserialize, Serialize};

/// 週期下限，避免極高頻率造成退化週期
const MIN_PERIOD: f64 = 1e-4;

/// 抖動取樣模式
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum JitterMode {
    /// 生成時取樣一次，之後固定不變。可重現、可測試，為預設值。
    #[default]
    FixedAtSpawn,
    /// 每個 tick 重新取樣。比較躁動，需要明確選用。
    ResampleEachTick,
}

/// 判斷光束此刻是否點亮
///
/// 頻率不大於 0 時視為常亮。否則以 `1/hz` 為基礎週期，乘上
/// `(1 + jitter_sample)` 後取 `(now + phase)` 在週期內的位置，
/// 落在前 `duty` 比例內即為點亮。`duty` 夾在 0..1。
pub fn beam_is_on(now: f64, phase: f32, hz: f32, duty: f32, jitter_sample: f32) -> bool {
    if hz <= 0.0 {
        return true;
    }
    let base = 1.0 / hz as f64;
    let period = (base * (1.0 + jitter_sample as f64)).max(MIN_PERIOD);
    let local = (now + phase as f64).rem_euclid(period);
    local < period * duty.clamp(0.0, 1.0) as f64
}
