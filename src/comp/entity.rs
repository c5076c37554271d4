/// 可見性系統的實體資料定義

use serde::{Deserialize, Serialize};
use vek::Vec3;

/// 被追蹤實體的穩定識別碼
///
/// 所有查詢與快取都以 id 為鍵，不持有任何實體參考，
/// 實體消失後不會殘留懸空項目
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

/// 靜態場景物件的識別碼（與實體 id 分屬不同編號空間）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SceneryId(pub u64);

/// 實體類別標籤
///
/// 用於宣告式的類別覆寫（例如競技模式下所有連線玩家永遠可見）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityCategory {
    /// 敵對 NPC
    HostileNpc,
    /// 連線玩家
    NetworkedPlayer,
    /// 中立 NPC
    NeutralNpc,
    /// 召喚物
    Summon,
    /// 建築單位
    Structure,
}

/// 被追蹤的實體
///
/// 位置由外部每 tick 推入更新，本系統只讀取
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackedEntity {
    /// 穩定識別碼
    pub id: EntityId,
    /// 實體類別
    pub category: EntityCategory,
    /// 世界座標（Y 軸向上，地面為 XZ 平面）
    pub pos: Vec3<f32>,
    /// 是否存活
    pub alive: bool,
}

impl TrackedEntity {
    /// 創建新的被追蹤實體（預設存活）
    pub fn new(id: EntityId, category: EntityCategory, pos: Vec3<f32>) -> Self {
        Self {
            id,
            category,
            pos,
            alive: true,
        }
    }
}

/// 單一實體的可見性狀態
///
/// raw 是每次評估重新計算的瞬時判定，published 是經過
/// 停留時間過濾後對外公布的狀態。published 只能在 raw
/// 變為 true 的瞬間變為 true；只能在 raw 持續為 false 且
/// 超過停留門檻後變為 false
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityState {
    /// 瞬時判定結果
    pub raw_visible: bool,
    /// 對外公布的狀態
    pub published_visible: bool,
    /// 最後一次瞬時判定為可見的時間（秒）
    pub last_visible_time: f64,
}

impl Default for VisibilityState {
    /// 註冊時的初始狀態為隱藏
    fn default() -> Self {
        Self {
            raw_visible: false,
            published_visible: false,
            last_visible_time: 0.0,
        }
    }
}
