use failure::{err_msg, Error};
use serde::{Deserialize, Serialize};

/// 示範程式設定（game.toml）
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct DemoSetting {
    /// 每秒 tick 數
    pub tps: u64,
    /// 聚合器每 tick 的格子寫入預算
    pub apply_budget: usize,
    /// 地圖描述檔路徑
    pub map_path: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
struct Setting {
    demo: DemoSetting,
}

impl DemoSetting {
    /// 從 toml 檔載入。設定由嵌入端明確傳遞，不走全域單例。
    pub fn load(path: &str) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| err_msg(format!("no such file {} exception:{}", path, e)))?;
        let setting: Setting =
            toml::from_str(&text).map_err(|e| err_msg(format!("設定檔解析失敗: {}", e)))?;
        Ok(setting.demo)
    }
}
