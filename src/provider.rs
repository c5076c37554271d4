/// 外部協作者介面
///
/// 物理射線、視野半徑來源與渲染端都是黑盒協作者，
/// 本系統只依賴這裡定義的介面，不持有它們的內部狀態
use failure::Error;
use vek::{Vec2, Vec3};

use crate::comp::{EntityId, SceneryId};

/// 物理層遮罩
pub type LayerMask = u32;

/// 預設遮罩：不過濾任何物理層
pub const ALL_LAYERS: LayerMask = u32::MAX;

/// 射線命中資訊
#[derive(Debug, Clone, PartialEq)]
pub struct HitInfo {
    /// 命中點世界座標
    pub position: Vec3<f32>,
    /// 命中物件若是被追蹤實體，其識別碼
    pub object_id: Option<EntityId>,
    /// 命中物件在地面平面上的包圍尺寸（無法量測時為 None）
    pub bounding_size_xz: Option<Vec2<f32>>,
}

/// 射線查詢提供者
///
/// 同步阻塞呼叫；查詢失敗屬於暫時性錯誤，
/// 呼叫端以「無遮擋」作為保守降級處理
pub trait RayCastProvider {
    fn cast(
        &self,
        origin: Vec3<f32>,
        direction: Vec3<f32>,
        max_distance: f32,
        mask: LayerMask,
    ) -> Result<Option<HitInfo>, Error>;
}

/// 視野半徑提供者
///
/// 半徑可能隨屬性系統在運行期變動，每個評估 pass 重新讀取
pub trait VisionRadiusProvider {
    fn radius(&self) -> f32;
}

/// 渲染端介面
///
/// 引擎在狀態轉換時呼叫，不保存任何渲染狀態
pub trait RenderSink {
    /// 切換實體的可見表現
    fn set_visible(&mut self, id: EntityId, visible: bool);
    /// 設定靜態場景物件的調暗係數
    fn set_darken(&mut self, id: SceneryId, factor: f32);
}
