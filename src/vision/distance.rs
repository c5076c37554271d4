/// 視野距離度量
///
/// 支援全 3D 距離與僅地面平面兩種語意，外加可選的最大高度差截斷
use vek::{Vec2, Vec3};

/// 計算觀察者到目標的視野距離
///
/// `ignore_height` 為真時，兩點先投影到 XZ 地面平面再取歐氏距離
/// （無論高低差都可以看見）。否則使用完整 3D 距離，但高度差
/// 超過 `max_height_difference` 時回傳無窮大——例如地面觀察者
/// 頭頂高處的飛行單位，無論水平距離多近都視為不可及
pub fn sight_distance(
    viewer_pos: Vec3<f32>,
    target_pos: Vec3<f32>,
    ignore_height: bool,
    max_height_difference: f32,
) -> f32 {
    if ignore_height {
        let a = Vec2::new(viewer_pos.x, viewer_pos.z);
        let b = Vec2::new(target_pos.x, target_pos.z);
        return a.distance(b);
    }

    if (viewer_pos.y - target_pos.y).abs() > max_height_difference {
        return f32::INFINITY;
    }

    viewer_pos.distance(target_pos)
}
