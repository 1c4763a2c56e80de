//! OAuth2 账户关联

mod linker;
mod providers;

pub use linker::*;
pub use providers::*;
