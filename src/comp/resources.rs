use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::reveal::grid::RevealGrid;
use crate::reveal::occlusion::RayCaster;

/// A resource that stores the tick (i.e: physics) time.
#[derive(Copy, Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Time(pub f64);

/// A resource that stores the time since the previous tick.
#[derive(Copy, Clone, Debug, Default)]
pub struct DeltaTime(pub f32);

// Start of Tick, used for metrics
#[derive(Copy, Clone)]
pub struct TickStart(pub Instant);

#[derive(Copy, Clone, Default)]
pub struct Tick(pub u64);

/// 外部網格供應者。尚未掛載時為 None，光照系統會安全跳過。
#[derive(Default)]
pub struct GridRes(pub Option<Box<dyn RevealGrid + Send + Sync>>);

/// 外部遮擋射線供應者。
#[derive(Default)]
pub struct OccluderRes(pub Option<Box<dyn RayCaster + Send + Sync>>);
