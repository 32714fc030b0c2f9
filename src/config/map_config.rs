/// 示範地圖描述
///
/// 對應 example/demo_map.json：來源圖層的圖塊區塊、遮擋線段與
/// 光源預設，可直接建出記憶體網格和遮擋世界。
use failure::{err_msg, Error};
use serde::{Deserialize, Serialize};
use vek::{Rgba, Vec2};

use crate::comp::{GlowLight, GlowShape, LightParams};
use crate::reveal::grid::{CellPos, MemoryTileGrid, TileId};
use crate::reveal::occlusion::OccluderMap;

/// 地圖設定
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MapConfig {
    /// 每格的物理大小
    pub cell_size: f32,
    /// 網格原點（世界座標）
    pub origin: [f32; 2],
    /// 來源圖層的矩形圖塊區塊
    pub tile_blocks: Vec<TileBlock>,
    /// 遮擋線段
    pub occluders: Vec<OccluderConfig>,
    /// 光源預設
    pub cones: Vec<ConeConfig>,
}

/// 一塊矩形的圖塊區域（含邊界）
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct TileBlock {
    pub min: [i32; 2],
    pub max: [i32; 2],
    pub tile: u32,
    /// RGBA，各分量 0..1
    pub color: [f32; 4],
}

/// 一條遮擋線段
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct OccluderConfig {
    pub name: String,
    pub from: [f32; 2],
    pub to: [f32; 2],
    pub layer: u8,
}

/// 一個光源預設
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ConeConfig {
    pub name: String,
    pub pos: [f32; 2],
    pub facing: [f32; 2],
    pub light: LightParams,
    /// 發光外觀，可省略
    pub glow: Option<GlowConfig>,
}

/// 發光外觀設定
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct GlowConfig {
    pub on_intensity: f32,
    pub off_intensity: f32,
    pub lerp_speed: f32,
    pub sync_shape: bool,
}

impl MapConfig {
    /// 從 JSON 檔載入
    pub fn load(path: &str) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| err_msg(format!("無法讀取地圖描述檔 {}: {}", path, e)))?;
        let config: MapConfig = serde_json::from_str(&text)
            .map_err(|e| err_msg(format!("地圖描述檔解析失敗: {}", e)))?;
        Ok(config)
    }

    /// 依設定建立記憶體網格：來源圖層填好，照亮圖層空白
    pub fn build_grid(&self) -> MemoryTileGrid {
        let mut grid = MemoryTileGrid::new(
            Vec2::new(self.origin[0], self.origin[1]),
            Vec2::new(self.cell_size, self.cell_size),
        );
        for block in &self.tile_blocks {
            grid.fill_rect(
                CellPos::new(block.min[0], block.min[1]),
                CellPos::new(block.max[0], block.max[1]),
                TileId(block.tile),
                Rgba::new(block.color[0], block.color[1], block.color[2], block.color[3]),
            );
        }
        grid
    }

    /// 依設定建立遮擋世界
    pub fn build_occluders(&self) -> OccluderMap {
        let mut map = OccluderMap::new();
        for occ in &self.occluders {
            map.add_segment(
                &occ.name,
                Vec2::new(occ.from[0], occ.from[1]),
                Vec2::new(occ.to[0], occ.to[1]),
                occ.layer,
            );
        }
        map
    }
}

impl GlowConfig {
    pub fn to_glow(&self) -> GlowLight {
        GlowLight {
            on_intensity: self.on_intensity,
            off_intensity: self.off_intensity,
            lerp_speed: self.lerp_speed,
            intensity: 0.0,
            sync_shape: self.sync_shape,
            shape: GlowShape::Cone {
                radius: 0.0,
                arc_deg: 0.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reveal::grid::RevealGrid;
    use crate::reveal::occlusion::{OccluderMask, RayCaster};

    const MAP_JSON: &str = r#"{
        "cell_size": 1.0,
        "origin": [-4.0, -4.0],
        "tile_blocks": [
            { "min": [0, 0], "max": [3, 3], "tile": 2, "color": [0.1, 0.2, 0.3, 1.0] }
        ],
        "occluders": [
            { "name": "wall_a", "from": [1.0, -2.0], "to": [1.0, 2.0], "layer": 0 }
        ],
        "cones": [
            {
                "name": "guard",
                "pos": [-2.0, 0.0],
                "facing": [1.0, 0.0],
                "light": { "range": 9.0, "half_angle_deg": 40.0, "occluder_mask": 1 },
                "glow": { "on_intensity": 1.2, "off_intensity": 0.0, "lerp_speed": 10.0, "sync_shape": true }
            }
        ]
    }"#;

    /// 省略的光源欄位落回預設值
    #[test]
    fn test_parse_map_with_partial_light_spec() {
        let config: MapConfig = serde_json::from_str(MAP_JSON).unwrap();
        assert_eq!(config.cones.len(), 1);

        let light = &config.cones[0].light;
        assert_eq!(light.range, 9.0);
        assert_eq!(light.half_angle_deg, 40.0);
        assert_eq!(light.occluder_mask.0, 1);
        assert_eq!(light.flicker_hz, 0.0, "沒寫的欄位用預設值");
        assert_eq!(light.linger_seconds, 0.2);
    }

    /// 建出來的網格與遮擋世界跟描述一致
    #[test]
    fn test_build_grid_and_occluders() {
        let config: MapConfig = serde_json::from_str(MAP_JSON).unwrap();

        let grid = config.build_grid();
        assert_eq!(grid.source_count(), 16);
        assert!(grid.has_cell(CellPos::new(0, 0)));
        assert!(!grid.has_cell(CellPos::new(4, 0)));
        assert_eq!(grid.tile_of(CellPos::new(2, 2)), Some(TileId(2)));
        // 原點偏移後 (0,0) 的格心在 (-3.5, -3.5)
        assert_eq!(grid.cell_center(CellPos::new(0, 0)), Vec2::new(-3.5, -3.5));

        let occluders = config.build_occluders();
        assert_eq!(occluders.segment_count(), 1);
        assert!(occluders.cast(
            Vec2::new(0.0, 0.0),
            Vec2::unit_x(),
            5.0,
            OccluderMask::single(0)
        ));
    }
}
