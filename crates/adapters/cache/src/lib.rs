//! voyage-adapter-cache - 进程内会话存储适配器
//!
//! 基于 moka 的 `SessionStore` 实现，每种用途一个独立命名实例

mod registry;
mod store;

pub use registry::*;
pub use store::*;
