/// 可見性系統資料模型

pub mod entity;
pub mod viewer;

pub use self::{entity::*, viewer::*};
