//! 代金券账本：下单、状态流转、目录维护与列表缓存

mod commands;
mod service;

pub use commands::*;
pub use service::*;
