//! voyage-auth-core - 认证核心库
//!
//! JWT 编解码、Claims 与角色检查

mod authorization;
mod codec;

pub use authorization::*;
pub use codec::*;
