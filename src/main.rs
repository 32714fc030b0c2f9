#![allow(unused)]

use std::time::Duration;

use failure::Error;
use log::{debug, error, info, warn};
use rand::SeedableRng;
use specs::WorldExt;
use vek::Vec2;

use litgrid::clock::Clock;
use litgrid::comp::{State, Tick};
use litgrid::config::{DemoSetting, MapConfig};
use litgrid::reveal::aggregator::RevealAggregator;

fn main() -> Result<(), Error> {
    log4rs::init_file("log4rs.yml", Default::default()).unwrap();

    let setting = DemoSetting::load("game.toml")?;
    let map = MapConfig::load(&setting.map_path)?;
    info!(
        "map loaded: {} tile blocks, {} occluders, {} cones",
        map.tile_blocks.len(),
        map.occluders.len(),
        map.cones.len()
    );

    let mut state = State::new();
    state.attach_grid(Box::new(map.build_grid()));
    state.attach_occluders(Box::new(map.build_occluders()));
    state.set_apply_budget(setting.apply_budget);

    // 固定種子讓示範每次跑起來一致
    let mut rng = rand_pcg::Pcg64Mcg::seed_from_u64(7);
    for cone in &map.cones {
        state.spawn_light(
            Vec2::new(cone.pos[0], cone.pos[1]),
            Vec2::new(cone.facing[0], cone.facing[1]),
            cone.light.clone(),
            cone.glow.as_ref().map(|g| g.to_glow()),
            &mut rng,
        );
        info!("spawned cone {} at ({}, {})", cone.name, cone.pos[0], cone.pos[1]);
    }

    let tps = setting.tps.max(1);
    let mut clock = Clock::new(Duration::from_secs_f64(1.0 / tps as f64));
    loop {
        // 示範用的移動目標：光錐跟著繞圈的點轉向。實際遊戲裡這是
        // 關卡端的瞄準邏輯，不屬於照亮核心。
        let t = state.get_time() as f32;
        let target = Vec2::new((t * 0.4).cos(), (t * 0.4).sin()) * 6.0;
        state.aim_all_lights(target);

        state.tick(clock.dt())?;

        let tick = state.ecs().read_resource::<Tick>().0;
        if tick % tps == 0 {
            let lit = state
                .ecs()
                .read_resource::<RevealAggregator>()
                .last_applied()
                .len();
            info!("tick {} lit cells {}", tick, lit);
        }

        // Wait for the next tick.
        clock.tick();
    }
}
