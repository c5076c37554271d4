/// 可見性計算模組
///
/// 包含距離度量、視線遮擋、滯留過濾、調暗插值與引擎協調
pub mod darkening;
pub mod distance;
pub mod engine;
pub mod evaluator;
pub mod hysteresis;
pub mod los;
pub mod registry;
pub mod vision_ecs;

pub use self::{
    darkening::{darken_factor, shaded_color, DarkeningInterpolator, SceneryItem},
    distance::sight_distance,
    engine::{EngineStats, VisionEngine, VisionEvent},
    evaluator::evaluate_raw,
    los::{has_line_of_sight, is_blocking},
    registry::{EntityRegistry, RegistryCommand, RegistryHandle, RegistryStats},
    vision_ecs::*,
};
