//! ports - 抽象 trait 层
//!
//! 定义核心依赖的全部外部能力：会话存储、持久化、密码哈希、通知

mod notifier;
mod password;
mod repository;
mod session_store;
mod unit_of_work;

pub use notifier::*;
pub use password::*;
pub use repository::*;
pub use session_store::*;
pub use unit_of_work::*;
