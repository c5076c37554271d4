/// 視線遮擋檢查
///
/// 由眼睛高度的兩點間發出射線查詢，命中結果交給障礙物
/// 分類器判定是否足以遮擋視線
use vek::{Vec2, Vec3};

use crate::comp::TrackedEntity;
use crate::provider::{LayerMask, RayCastProvider};

/// 障礙物分類器
///
/// 小型道具（燈柱、植被）不遮擋視線，大型結構（牆、建築）
/// 才遮擋。無法量測包圍尺寸的物件保守地視為遮擋
pub fn is_blocking(bounding_size_xz: Option<Vec2<f32>>, min_obstacle_size: f32) -> bool {
    match bounding_size_xz {
        Some(size) => size.x.max(size.y) >= min_obstacle_size,
        None => true,
    }
}

/// 檢查觀察者到目標實體之間是否有視線
///
/// 射線起點與終點都抬高 `eye_height`。沒有命中任何東西即
/// 視線暢通；命中目標實體本身不算遮擋（實體不能遮住自己）；
/// 其餘命中交給障礙物分類器。射線提供者失敗時以「無遮擋」
/// 降級處理並記錄，暫時性的感測錯誤不得讓真實實體憑空消失
pub fn has_line_of_sight(
    provider: &dyn RayCastProvider,
    viewer_pos: Vec3<f32>,
    target: &TrackedEntity,
    eye_height: f32,
    min_obstacle_size: f32,
    mask: LayerMask,
) -> bool {
    let eye_offset = Vec3::new(0.0, eye_height, 0.0);
    let origin = viewer_pos + eye_offset;
    let target_eye = target.pos + eye_offset;

    let delta = target_eye - origin;
    let max_distance = delta.magnitude();
    if max_distance <= f32::EPSILON {
        return true;
    }
    let direction = delta / max_distance;

    match provider.cast(origin, direction, max_distance, mask) {
        Ok(None) => true,
        Ok(Some(hit)) => {
            if hit.object_id == Some(target.id) {
                // 命中的就是目標本身，不構成遮擋
                return true;
            }
            !is_blocking(hit.bounding_size_xz, min_obstacle_size)
        }
        Err(e) => {
            log::warn!("raycast toward {:?} failed, treating as clear: {}", target.id, e);
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comp::{EntityCategory, EntityId};
    use crate::provider::{HitInfo, ALL_LAYERS};
    use failure::{err_msg, Error};

    /// 回傳固定結果的射線提供者
    struct FixedRay {
        hit: Option<HitInfo>,
        fail: bool,
    }

    impl RayCastProvider for FixedRay {
        fn cast(
            &self,
            _origin: Vec3<f32>,
            _direction: Vec3<f32>,
            _max_distance: f32,
            _mask: LayerMask,
        ) -> Result<Option<HitInfo>, Error> {
            if self.fail {
                return Err(err_msg("sensor glitch"));
            }
            Ok(self.hit.clone())
        }
    }

    fn target_at(x: f32) -> TrackedEntity {
        TrackedEntity::new(
            EntityId(1),
            EntityCategory::HostileNpc,
            Vec3::new(x, 0.0, 0.0),
        )
    }

    fn wall_hit(size: Vec2<f32>) -> HitInfo {
        HitInfo {
            position: Vec3::new(5.0, 1.5, 0.0),
            object_id: Some(EntityId(99)),
            bounding_size_xz: Some(size),
        }
    }

    #[test]
    fn test_obstacle_classifier_threshold() {
        assert!(is_blocking(Some(Vec2::new(8.0, 1.0)), 2.0));
        assert!(is_blocking(Some(Vec2::new(1.0, 2.0)), 2.0));
        assert!(!is_blocking(Some(Vec2::new(0.5, 1.9)), 2.0));
    }

    #[test]
    fn test_unmeasurable_obstacle_blocks_conservatively() {
        assert!(is_blocking(None, 2.0));
    }

    #[test]
    fn test_no_hit_means_clear_sight() {
        let ray = FixedRay { hit: None, fail: false };
        assert!(has_line_of_sight(
            &ray,
            Vec3::zero(),
            &target_at(10.0),
            1.5,
            2.0,
            ALL_LAYERS
        ));
    }

    #[test]
    fn test_large_obstacle_blocks_sight() {
        let ray = FixedRay { hit: Some(wall_hit(Vec2::new(10.0, 0.4))), fail: false };
        assert!(!has_line_of_sight(
            &ray,
            Vec3::zero(),
            &target_at(10.0),
            1.5,
            2.0,
            ALL_LAYERS
        ));
    }

    #[test]
    fn test_small_prop_does_not_block() {
        let ray = FixedRay { hit: Some(wall_hit(Vec2::new(0.3, 0.3))), fail: false };
        assert!(has_line_of_sight(
            &ray,
            Vec3::zero(),
            &target_at(10.0),
            1.5,
            2.0,
            ALL_LAYERS
        ));
    }

    #[test]
    fn test_no_self_occlusion() {
        // 命中的物件就是目標本身
        let hit = HitInfo {
            position: Vec3::new(10.0, 1.5, 0.0),
            object_id: Some(EntityId(1)),
            bounding_size_xz: Some(Vec2::new(50.0, 50.0)),
        };
        let ray = FixedRay { hit: Some(hit), fail: false };
        assert!(has_line_of_sight(
            &ray,
            Vec3::zero(),
            &target_at(10.0),
            1.5,
            2.0,
            ALL_LAYERS
        ));
    }

    #[test]
    fn test_provider_error_fails_open() {
        let ray = FixedRay { hit: None, fail: true };
        assert!(has_line_of_sight(
            &ray,
            Vec3::zero(),
            &target_at(10.0),
            1.5,
            2.0,
            ALL_LAYERS
        ));
    }
}
