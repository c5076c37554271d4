/// 滯留過濾器
///
/// 以每實體的停留計時包裹瞬時判定，吸收半徑邊界附近
/// 因移動或幀時序造成的抖動。直接對外公布瞬時判定會在
/// 視野邊緣產生明顯的閃爍，這層過濾是本子系統最重要的
/// 正確性條件
use crate::comp::VisibilityState;

/// 將瞬時判定套用到實體狀態，回傳實際發生的公布轉換
///
/// 狀態機規則：
/// - 隱藏 → 可見：瞬時判定為真的當下立即發生，同時刷新
///   `last_visible_time`（重新出現沒有額外延遲）
/// - 可見期間瞬時判定持續為真：持續刷新 `last_visible_time`
/// - 可見 → 隱藏：僅在瞬時判定為假且 `now - last_visible_time`
///   超過停留門檻時發生；門檻未到前對外仍回報可見
pub fn publish(
    state: &mut VisibilityState,
    raw: bool,
    now: f64,
    dwell_threshold: f32,
) -> Option<bool> {
    state.raw_visible = raw;

    if raw {
        state.last_visible_time = now;
        if !state.published_visible {
            state.published_visible = true;
            return Some(true);
        }
        return None;
    }

    if state.published_visible && now - state.last_visible_time > f64::from(dwell_threshold) {
        state.published_visible = false;
        return Some(false);
    }

    None
}
