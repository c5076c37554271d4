/// 配置模組

pub mod vision_config;

pub use self::vision_config::VisionConfig;
