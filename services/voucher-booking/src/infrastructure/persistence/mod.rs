//! 持久化
//!
//! 进程内参考实现：全部表位于一把异步互斥锁之后，
//! 事务在暂存副本上执行，提交时整体替换。

mod memory_store;
mod tx_repositories;

pub use memory_store::*;
pub use tx_repositories::*;
