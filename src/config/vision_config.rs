/// 可見性引擎配置
///
/// 所有欄位皆可熱更新；數值錯誤一律鉗制並記錄，不會 panic
use failure::Error;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::Read;

use crate::comp::EntityCategory;
use crate::provider::{LayerMask, ALL_LAYERS};

/// 可見性引擎配置
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct VisionConfig {
    /// 視野半徑（世界單位），半徑提供者存在時作為後備值
    pub radius: f32,
    /// 是否忽略高度差（距離投影到 XZ 平面計算）
    pub ignore_height: bool,
    /// 允許的最大高度差，超過即視為不可見
    pub max_height_difference: f32,
    /// 是否啟用視線遮擋檢查
    pub use_line_of_sight: bool,
    /// 遮擋判定的最小障礙物尺寸
    pub min_obstacle_size: f32,
    /// 消失前 raw 判定需持續為否的停留時間（秒）
    pub dwell_threshold: f32,
    /// 調暗過渡帶寬度（世界單位）
    pub transition_band: f32,
    /// 評估間隔（秒），與渲染幀率無關
    pub update_interval: f32,
    /// 視線射線的眼睛高度偏移
    pub eye_height: f32,
    /// 過渡帶外靜態場景的亮度倍率
    pub darkened_brightness: f32,
    /// 射線查詢使用的物理層遮罩
    pub layer_mask: LayerMask,
    /// 永遠可見的實體類別（完全跳過評估與滯留過濾）
    pub always_visible_categories: HashSet<EntityCategory>,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            radius: 60.0,
            ignore_height: false,
            max_height_difference: 20.0,
            use_line_of_sight: true,
            min_obstacle_size: 2.0,
            dwell_threshold: 0.15,
            transition_band: 10.0,
            update_interval: 0.2,
            eye_height: 1.5,
            darkened_brightness: 0.35,
            layer_mask: ALL_LAYERS,
            always_visible_categories: HashSet::new(),
        }
    }
}

impl VisionConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file(file_path: &str) -> Result<Self, Error> {
        let mut file = File::open(file_path)?;
        let mut str_val = String::new();
        file.read_to_string(&mut str_val)?;
        let config: VisionConfig = toml::from_str(&str_val)?;
        Ok(config.sanitized())
    }

    /// 回傳鉗制後的配置
    ///
    /// 負數一律鉗制為零並記錄警告，配置錯誤不得使引擎 panic
    pub fn sanitized(mut self) -> Self {
        self.radius = Self::clamp_non_negative("radius", self.radius);
        self.max_height_difference =
            Self::clamp_non_negative("max_height_difference", self.max_height_difference);
        self.min_obstacle_size =
            Self::clamp_non_negative("min_obstacle_size", self.min_obstacle_size);
        self.dwell_threshold = Self::clamp_non_negative("dwell_threshold", self.dwell_threshold);
        self.transition_band = Self::clamp_non_negative("transition_band", self.transition_band);
        self.update_interval = Self::clamp_non_negative("update_interval", self.update_interval);
        self.eye_height = Self::clamp_non_negative("eye_height", self.eye_height);
        self.darkened_brightness = self.darkened_brightness.clamp(0.0, 1.0);
        self
    }

    fn clamp_non_negative(name: &str, value: f32) -> f32 {
        if value < 0.0 || !value.is_finite() {
            log::warn!("config field {} = {} is invalid, clamped to 0", name, value);
            0.0
        } else {
            value
        }
    }
}
