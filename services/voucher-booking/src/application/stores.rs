//! 各用途的会话存储类型

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use voyage_common::PagedResult;
use voyage_domain_core::{PrincipalProfile, Voucher};
use voyage_ports::SessionStore;

use crate::application::auth::ResetTicket;

/// principal id -> 当前刷新令牌
pub type RefreshTokenStore = Arc<dyn SessionStore<String>>;

/// 重置令牌摘要 -> 重置凭据
pub type ResetTokenStore = Arc<dyn SessionStore<ResetTicket>>;

/// `login:fail:{ip}` -> 连续失败次数
pub type AttemptStore = Arc<dyn SessionStore<u32>>;

/// id / 用户名 -> 用户快照
pub type ProfileStore = Arc<dyn SessionStore<PrincipalProfile>>;

/// 列表缓存键 -> 分页结果
pub type VoucherPageStore = Arc<dyn SessionStore<PagedResult<Voucher>>>;

/// 缓存失效代数
///
/// 读穿透时先记下代数，写入缓存后再比较；期间发生过失效就撤回刚写入的条目。
/// 失效方必须先 `bump` 再清理缓存。
#[derive(Debug, Clone, Default)]
pub struct CacheGeneration(Arc<AtomicU64>);

impl CacheGeneration {
    pub fn current(&self) -> u64 {
        self.0.load(Ordering::Acquire)
    }

    pub fn bump(&self) {
        self.0.fetch_add(1, Ordering::AcqRel);
    }

    pub fn changed_since(&self, seen: u64) -> bool {
        self.current() != seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generation_is_shared_between_clones() {
        let generation = CacheGeneration::default();
        let seen = generation.current();
        let other = generation.clone();

        assert!(!generation.changed_since(seen));
        other.bump();
        assert!(generation.changed_since(seen));
    }
}
