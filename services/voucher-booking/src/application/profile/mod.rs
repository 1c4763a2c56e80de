//! 用户资料：带缓存的读取、余额充值、启用状态

mod service;

pub use service::*;
