use serde::{Deserialize, Serialize};
use specs::storage::VecStorage;
use specs::Component;
use vek::*;

/// Position
#[derive(Copy, Clone, Default, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pos(pub Vec2<f32>);

impl Component for Pos {
    type Storage = VecStorage<Self>;
}

/// Facing direction of a beam, unit vector, +X convention
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Facing(pub Vec2<f32>);

impl Default for Facing {
    fn default() -> Self {
        Facing(Vec2::unit_x())
    }
}

impl Facing {
    /// Turn toward a world position; keeps the old facing when the
    /// target overlaps the origin.
    pub fn look_at(&mut self, from: Vec2<f32>, target: Vec2<f32>) {
        let dir = target - from;
        if dir.magnitude_squared() > 1e-4 {
            self.0 = dir.normalized();
        }
    }
}

impl Component for Facing {
    type Storage = VecStorage<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_look_at_keeps_facing_on_overlap() {
        let mut f = Facing::default();
        f.look_at(Vec2::new(1.0, 1.0), Vec2::new(1.0, 5.0));
        assert!((f.0 - Vec2::unit_y()).magnitude() < 1e-5);

        // 目標跟自己重疊時維持原朝向
        f.look_at(Vec2::new(1.0, 1.0), Vec2::new(1.0, 1.0));
        assert!((f.0 - Vec2::unit_y()).magnitude() < 1e-5);
    }
}
