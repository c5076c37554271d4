/// 觀察者上下文定義

use vek::Vec3;

use crate::config::VisionConfig;

/// 單次評估使用的觀察者上下文
///
/// 每個評估 pass 由引擎重新組裝：位置來自宿主、半徑
/// 每次重新向半徑提供者讀取（不快取），其餘欄位取自當前配置
#[derive(Debug, Clone, Copy)]
pub struct ViewerContext {
    /// 觀察者位置
    pub pos: Vec3<f32>,
    /// 視野半徑
    pub radius: f32,
    /// 是否忽略高度差（距離投影到地面計算）
    pub ignore_height: bool,
    /// 允許的最大高度差（僅在不忽略高度時生效）
    pub max_height_difference: f32,
    /// 是否啟用視線檢查
    pub use_line_of_sight: bool,
    /// 遮擋物的最小尺寸門檻
    pub min_obstacle_size: f32,
}

impl ViewerContext {
    /// 由配置與當前半徑組裝觀察者上下文
    pub fn from_config(pos: Vec3<f32>, radius: f32, config: &VisionConfig) -> Self {
        Self {
            pos,
            radius,
            ignore_height: config.ignore_height,
            max_height_difference: config.max_height_difference,
            use_line_of_sight: config.use_line_of_sight,
            min_obstacle_size: config.min_obstacle_size,
        }
    }
}
