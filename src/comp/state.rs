use std::sync::Arc;
use std::time::{Duration, Instant};

use failure::{err_msg, Error};
use rand::Rng;
use rayon::{ThreadPool, ThreadPoolBuilder};
use specs::{Builder, DispatcherBuilder, Entity, Join, WorldExt};
use vek::Vec2;

use crate::comp::*;
use crate::reveal::aggregator::RevealAggregator;
use crate::reveal::grid::RevealGrid;
use crate::reveal::occlusion::RayCaster;
use crate::tick::{glow_tick, light_tick};

const MAX_DELTA_TIME: f32 = 1.0;

/// 模擬世界的外殼
///
/// 持有 ECS world 與執行緒池，負責資源安裝、光源生成/移除、
/// 以及每 tick 的系統調度。聚合器在這裡以資源形式被明確持有，
/// 不是隱藏的靜態單例。
pub struct State {
    ecs: specs::World,
    // Avoid lifetime annotation by storing a thread pool instead of the whole dispatcher
    thread_pool: Arc<ThreadPool>,
}

impl State {
    pub fn new() -> Self {
        let thread_pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(num_cpus::get())
                .thread_name(move |i| format!("rayon-{}", i))
                .build()
                .unwrap(),
        );
        Self {
            ecs: Self::setup_ecs_world(),
            thread_pool,
        }
    }

    fn setup_ecs_world() -> specs::World {
        let mut ecs = specs::World::new();
        // Register all components.
        ecs.register::<Pos>();
        ecs.register::<Facing>();
        ecs.register::<LightCone>();
        ecs.register::<GlowLight>();
        // Register unsynced resources used by the ECS.
        ecs.insert(Time(0.0));
        ecs.insert(DeltaTime(0.0));
        ecs.insert(Tick(0));
        ecs.insert(TickStart(Instant::now()));
        ecs.insert(RevealAggregator::default());
        ecs.insert(GridRes::default());
        ecs.insert(OccluderRes::default());
        ecs
    }

    /// Get a reference to the internal ECS world.
    pub fn ecs(&self) -> &specs::World {
        &self.ecs
    }

    /// Get a mutable reference to the internal ECS world.
    pub fn ecs_mut(&mut self) -> &mut specs::World {
        &mut self.ecs
    }

    pub fn thread_pool(&self) -> &Arc<ThreadPool> {
        &self.thread_pool
    }

    /// Get the current in-game time.
    pub fn get_time(&self) -> f64 {
        self.ecs.read_resource::<Time>().0
    }

    /// Get the current delta time.
    pub fn get_delta_time(&self) -> f32 {
        self.ecs.read_resource::<DeltaTime>().0
    }

    /// 掛上網格供應者
    pub fn attach_grid(&mut self, grid: Box<dyn RevealGrid + Send + Sync>) {
        self.ecs.write_resource::<GridRes>().0 = Some(grid);
    }

    /// 掛上遮擋射線供應者
    pub fn attach_occluders(&mut self, caster: Box<dyn RayCaster + Send + Sync>) {
        self.ecs.write_resource::<OccluderRes>().0 = Some(caster);
    }

    /// 設定聚合器的每 tick 寫入預算（所有光源共用）
    pub fn set_apply_budget(&mut self, budget: usize) {
        self.ecs
            .write_resource::<RevealAggregator>()
            .set_apply_budget(budget);
    }

    /// 生成一個光源實體；相位等隨機量由呼叫端的 rng 決定
    pub fn spawn_light(
        &mut self,
        pos: Vec2<f32>,
        facing: Vec2<f32>,
        params: LightParams,
        glow: Option<GlowLight>,
        rng: &mut impl Rng,
    ) -> Entity {
        let cone = LightCone::spawn(params, rng);
        let builder = self
            .ecs
            .create_entity()
            .with(Pos(pos))
            .with(Facing(if facing.magnitude_squared() > 1e-8 {
                facing.normalized()
            } else {
                Vec2::unit_x()
            }))
            .with(cone);
        match glow {
            Some(glow) => builder.with(glow).build(),
            None => builder.build(),
        }
    }

    /// 移除光源
    ///
    /// 先向聚合器註銷（立即重算，清掉殘影），再刪實體。
    pub fn remove_light(&mut self, ent: Entity) -> Result<(), Error> {
        let id = {
            let mut cones = self.ecs.write_storage::<LightCone>();
            cones.get_mut(ent).and_then(|cone| cone.source_id.take())
        };
        if let Some(id) = id {
            let mut agg = self.ecs.write_resource::<RevealAggregator>();
            let mut grid = self.ecs.write_resource::<GridRes>();
            match grid.0.as_mut() {
                Some(grid) => agg.unregister(id, grid.as_mut()),
                None => {
                    agg.remove_source(id);
                }
            }
        }
        self.ecs
            .delete_entity(ent)
            .map_err(|e| err_msg(format!("delete light entity failed: {:?}", e)))?;
        self.ecs.maintain();
        Ok(())
    }

    /// 推進一個模擬 tick
    ///
    /// 光照在 late 階段執行：先跑完嵌入端的位置更新，光錐幾何才
    /// 反映本 tick 的最終位置。
    pub fn tick(&mut self, dt: Duration) -> Result<(), Error> {
        self.ecs.write_resource::<Tick>().0 += 1;
        self.ecs.write_resource::<TickStart>().0 = Instant::now();
        self.ecs.write_resource::<Time>().0 += dt.as_secs_f64();
        self.ecs.write_resource::<DeltaTime>().0 = dt.as_secs_f32().min(MAX_DELTA_TIME);

        let dispatch_builder = DispatcherBuilder::new()
            .with_pool(Arc::clone(&self.thread_pool))
            .with(light_tick::Sys::default(), "light_tick", &[])
            .with(glow_tick::Sys::default(), "glow_tick", &["light_tick"]);

        let mut dispatcher = dispatch_builder.build();
        dispatcher.dispatch(&self.ecs);

        self.ecs.maintain();
        Ok(())
    }

    /// 把所有光源轉向某個世界座標（示範/測試用的小幫手）
    pub fn aim_all_lights(&mut self, target: Vec2<f32>) {
        let positions = self.ecs.read_storage::<Pos>();
        let mut facings = self.ecs.write_storage::<Facing>();
        for (pos, facing) in (&positions, &mut facings).join() {
            facing.look_at(pos.0, target);
        }
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}
