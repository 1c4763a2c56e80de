//! 认证与令牌生命周期

mod attempts;
mod reset;
mod service;

pub use attempts::*;
pub use reset::*;
pub use service::*;
