/// Arena Vision Library
///
/// Per-observer visibility for a real-time arena: vision radius,
/// line-of-sight occlusion, anti-flicker hysteresis and scenery darkening

pub mod comp;
pub mod config;
pub mod provider;
pub mod util;
pub mod vision;

// Re-export commonly used types
pub use crate::comp::*;
pub use crate::config::VisionConfig;
pub use crate::provider::*;
pub use crate::vision::*;
