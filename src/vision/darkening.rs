/// 靜態場景調暗插值
///
/// 對非戰鬥實體的靜態場景做獨立的 pass，沿用同一套距離
/// 度量產生 [0,1] 的連續調暗係數。每個物件的原始顏色在
/// 註冊時快照一次，之後顯示顏色永遠從原始值重新插值，
/// 重複呼叫不會漂移
use hashbrown::HashMap;
use vek::{Rgb, Vec3};

use crate::comp::SceneryId;
use crate::config::VisionConfig;
use crate::provider::RenderSink;
use crate::vision::distance::sight_distance;

/// 係數變化小於此值時不向渲染端重送
const FACTOR_EPSILON: f32 = 1.0e-4;

/// 靜態場景物件
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneryItem {
    pub id: SceneryId,
    pub pos: Vec3<f32>,
    /// 原始基底顏色
    pub base_color: Rgb<f32>,
    /// 原始自發光顏色
    pub emissive: Rgb<f32>,
}

/// 每個場景物件的調暗記錄
///
/// 保存註冊當下的原始顏色快照與當前係數
#[derive(Debug, Clone, Copy)]
pub struct DarkenRecord {
    item: SceneryItem,
    factor: f32,
}

/// 計算距離對應的調暗係數
///
/// 半徑內為 0，過渡帶外為 1，帶內以 smoothstep 平滑過渡
pub fn darken_factor(distance: f32, radius: f32, transition_band: f32) -> f32 {
    if distance <= radius {
        return 0.0;
    }
    if distance >= radius + transition_band {
        return 1.0;
    }
    let t = (distance - radius) / transition_band;
    t * t * (3.0 - 2.0 * t)
}

/// 由原始顏色與係數計算顯示顏色
///
/// `lerp(original, original * darkened_brightness, factor)`，
/// 永遠從原始快照出發，結果可完全還原
pub fn shaded_color(original: Rgb<f32>, darkened_brightness: f32, factor: f32) -> Rgb<f32> {
    let darkened = original * darkened_brightness;
    original + (darkened - original) * factor
}

/// 調暗插值器
pub struct DarkeningInterpolator {
    records: HashMap<SceneryId, DarkenRecord>,
}

impl DarkeningInterpolator {
    pub fn new() -> Self {
        Self {
            records: HashMap::new(),
        }
    }

    /// 註冊場景物件並快照其原始顏色
    ///
    /// 重複註冊被忽略，以免用已調暗的顏色覆蓋原始快照
    pub fn register(&mut self, item: SceneryItem) {
        self.records
            .entry(item.id)
            .or_insert(DarkenRecord { item, factor: 0.0 });
    }

    /// 移除場景物件
    pub fn unregister(&mut self, id: SceneryId) {
        self.records.remove(&id);
    }

    /// 查詢當前係數，未註冊的物件回傳 0
    pub fn factor(&self, id: SceneryId) -> f32 {
        self.records.get(&id).map(|r| r.factor).unwrap_or(0.0)
    }

    /// 依當前係數計算的基底顯示顏色
    pub fn shaded_base(&self, id: SceneryId, darkened_brightness: f32) -> Option<Rgb<f32>> {
        self.records
            .get(&id)
            .map(|r| shaded_color(r.item.base_color, darkened_brightness, r.factor))
    }

    /// 依當前係數計算的自發光顯示顏色
    pub fn shaded_emissive(&self, id: SceneryId, darkened_brightness: f32) -> Option<Rgb<f32>> {
        self.records
            .get(&id)
            .map(|r| shaded_color(r.item.emissive, darkened_brightness, r.factor))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// 對所有場景物件重算係數，變化超過容差時通知渲染端
    pub fn update(
        &mut self,
        viewer_pos: Vec3<f32>,
        radius: f32,
        config: &VisionConfig,
        mut sink: Option<&mut dyn RenderSink>,
    ) {
        for record in self.records.values_mut() {
            let distance = sight_distance(
                viewer_pos,
                record.item.pos,
                config.ignore_height,
                config.max_height_difference,
            );
            let factor = darken_factor(distance, radius, config.transition_band);

            if (factor - record.factor).abs() > FACTOR_EPSILON {
                record.factor = factor;
                if let Some(sink) = sink.as_deref_mut() {
                    sink.set_darken(record.item.id, factor);
                }
            }
        }
    }
}

impl Default for DarkeningInterpolator {
    fn default() -> Self {
        Self::new()
    }
}
