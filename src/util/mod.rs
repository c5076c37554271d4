/// 雜項工具

pub mod logging;
