pub mod demo_setting;
pub mod map_config;

pub use self::{demo_setting::DemoSetting, map_config::MapConfig};
