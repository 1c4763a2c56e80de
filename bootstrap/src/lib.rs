//! voyage-bootstrap - 统一服务启动骨架
//!
//! 配置加载、遥测初始化与关闭信号

mod runtime;

pub use runtime::*;
