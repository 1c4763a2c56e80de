//! domain-core - 代金券预订领域核心类型
//!
//! 用户、代金券、金额以及列表过滤条件

mod filter;
mod money;
mod principal;
mod voucher;

pub use filter::*;
pub use money::*;
pub use principal::*;
pub use voucher::*;

// Re-export common types
pub use voyage_common::{PrincipalId, VoucherId};
