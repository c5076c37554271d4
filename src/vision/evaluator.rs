/// 可見性評估器
///
/// 結合距離度量、視野半徑與視線檢查產生單一實體的瞬時判定。
/// 結果無記憶性，每個評估 pass 重新計算
use crate::comp::{TrackedEntity, ViewerContext};
use crate::provider::{LayerMask, RayCastProvider};
use crate::vision::distance::sight_distance;
use crate::vision::los::has_line_of_sight;

/// 產生一個實體的瞬時可見判定
///
/// 距離超出半徑即不可見；在半徑內且啟用視線檢查時由
/// 視線結果決定，否則直接可見。死亡實體一律不可見
pub fn evaluate_raw(
    viewer: &ViewerContext,
    entity: &TrackedEntity,
    provider: Option<&dyn RayCastProvider>,
    eye_height: f32,
    mask: LayerMask,
) -> bool {
    if !entity.alive {
        return false;
    }

    let distance = sight_distance(
        viewer.pos,
        entity.pos,
        viewer.ignore_height,
        viewer.max_height_difference,
    );
    if distance > viewer.radius {
        return false;
    }

    if viewer.use_line_of_sight {
        if let Some(provider) = provider {
            return has_line_of_sight(
                provider,
                viewer.pos,
                entity,
                eye_height,
                viewer.min_obstacle_size,
                mask,
            );
        }
        // 未接上射線提供者時視為無遮擋
    }

    true
}
