/// 發光外觀同步系統
///
/// 跟在光錐系統後面跑，把光錐的亮/殘光狀態鏡射成顯示強度。
/// 純消費者，不碰網格。
use specs::{Join, Read, ReadStorage, System, WriteStorage};

use crate::comp::{DeltaTime, GlowLight, GlowShape, LightCone};

#[derive(Default)]
pub struct Sys;

impl<'a> System<'a> for Sys {
    type SystemData = (
        Read<'a, DeltaTime>,
        ReadStorage<'a, LightCone>,
        WriteStorage<'a, GlowLight>,
    );

    fn run(&mut self, (dt, cones, mut glows): Self::SystemData) {
        let dt = dt.0;

        for (cone, glow) in (&cones, &mut glows).join() {
            // 形狀同步只對錐形外觀有意義，自由形狀忽略
            if glow.sync_shape {
                if let GlowShape::Cone { radius, arc_deg } = &mut glow.shape {
                    *radius = cone.params.range;
                    *arc_deg = cone.params.half_angle_deg * 2.0;
                }
            }

            let target = if cone.is_visually_on() {
                glow.on_intensity
            } else {
                glow.off_intensity
            };
            let t = (glow.lerp_speed * dt).clamp(0.0, 1.0);
            glow.intensity += (target - glow.intensity) * t;
        }
    }
}
