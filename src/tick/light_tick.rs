/// 光錐 late 階段系統
///
/// 位置更新完才輪到這裡，錐形幾何用的是本 tick 的最終位置。
/// 流程：閃爍判定 → 光束掃描 → 殘光更新 → 發佈 active 集 →
/// 聚合器套用聯集（每 tick 一次）。
use rand::Rng;
use specs::{Join, Read, ReadStorage, System, Write, WriteStorage};

use crate::comp::{Facing, GridRes, LightCone, OccluderRes, Pos, Tick, Time};
use crate::reveal::aggregator::RevealAggregator;
use crate::reveal::cone_scan::scan_cone;
use crate::reveal::flicker::{beam_is_on, JitterMode};

#[derive(Default)]
pub struct Sys;

impl<'a> System<'a> for Sys {
    type SystemData = (
        Read<'a, Time>,
        Read<'a, Tick>,
        ReadStorage<'a, Pos>,
        ReadStorage<'a, Facing>,
        WriteStorage<'a, LightCone>,
        Write<'a, RevealAggregator>,
        Write<'a, GridRes>,
        Read<'a, OccluderRes>,
    );

    fn run(
        &mut self,
        (time, tick, positions, facings, mut cones, mut agg, mut grid_res, caster_res): Self::SystemData,
    ) {
        // 供應者還沒掛上就跑 tick 屬於呼叫端違約：debug 大聲失敗，
        // release 安全跳過
        let grid = match grid_res.0.as_mut() {
            Some(grid) => grid.as_mut(),
            None => {
                debug_assert!(false, "light tick without a grid provider attached");
                return;
            }
        };
        let caster = match caster_res.0.as_ref() {
            Some(caster) => caster.as_ref(),
            None => {
                debug_assert!(false, "light tick without an occluder provider attached");
                return;
            }
        };

        let now = time.0;

        for (pos, facing, cone) in (&positions, &facings, &mut cones).join() {
            // 新光源第一次進到 late 階段時才跟聚合器登記
            let id = match cone.source_id {
                Some(id) => id,
                None => {
                    let id = agg.register();
                    cone.source_id = Some(id);
                    log::debug!("light source registered as {:?}", id);
                    id
                }
            };

            let jitter_sample = match cone.params.jitter_mode {
                JitterMode::FixedAtSpawn => cone.jitter_sample,
                JitterMode::ResampleEachTick => {
                    let j = cone.params.flicker_jitter;
                    if j > 0.0 {
                        rand::rng().random_range(-j..=j)
                    } else {
                        0.0
                    }
                }
            };
            cone.beam_on = beam_is_on(
                now,
                cone.phase,
                cone.params.flicker_hz,
                cone.params.flicker_duty,
                jitter_sample,
            );

            if cone.beam_on {
                scan_cone(
                    &*grid,
                    caster,
                    pos.0,
                    facing.0,
                    cone.params.range,
                    cone.params.half_angle_deg,
                    cone.params.occluder_mask,
                    cone.params.los_samples,
                    &mut cone.scan,
                );
            } else {
                cone.scan.clear();
            }

            cone.linger.update(&cone.scan, now, cone.params.linger_seconds);
            cone.linger.collect_active(&mut cone.active);
            agg.publish(id, &cone.active);
        }

        agg.apply_once(tick.0, grid);
    }
}
