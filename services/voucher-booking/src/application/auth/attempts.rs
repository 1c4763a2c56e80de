//! 登录失败计数

use voyage_config::LoginAttemptConfig;
use voyage_errors::AppResult;

use crate::application::stores::AttemptStore;

/// 按客户端 ip 统计连续登录失败
///
/// 计数器的过期由存储的 TTL（失败窗口）决定；每次失败都会重新计时。
#[derive(Clone)]
pub struct AttemptTracker {
    store: AttemptStore,
    max_failures: u32,
}

impl AttemptTracker {
    pub fn new(store: AttemptStore, config: LoginAttemptConfig) -> Self {
        Self {
            store,
            max_failures: config.max_failures,
        }
    }

    fn key(ip: &str) -> String {
        format!("login:fail:{}", ip)
    }

    /// 记录一次失败，返回当前计数
    pub async fn track(&self, ip: &str) -> AppResult<u32> {
        let key = Self::key(ip);
        let count = self.store.get(&key).await?.unwrap_or(0).saturating_add(1);
        self.store.store(&key, count).await?;
        Ok(count)
    }

    pub async fn is_blocked(&self, ip: &str) -> AppResult<bool> {
        let count = self.store.get(&Self::key(ip)).await?.unwrap_or(0);
        Ok(count >= self.max_failures)
    }

    pub async fn clear(&self, ip: &str) -> AppResult<()> {
        self.store.revoke(&Self::key(ip)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use voyage_adapter_cache::MokaSessionStore;
    use voyage_config::StorePolicy;

    fn tracker(max_failures: u32) -> AttemptTracker {
        let store = MokaSessionStore::<u32>::new(
            "failed_attempts",
            StorePolicy {
                ttl_secs: Some(60),
                max_capacity: 100,
            },
        );
        AttemptTracker::new(
            Arc::new(store),
            LoginAttemptConfig {
                max_failures,
                window_secs: 60,
            },
        )
    }

    #[tokio::test]
    async fn test_blocks_after_max_failures() {
        let tracker = tracker(3);

        for expected in 1..=2 {
            assert_eq!(tracker.track("10.0.0.1").await.unwrap(), expected);
            assert!(!tracker.is_blocked("10.0.0.1").await.unwrap());
        }
        tracker.track("10.0.0.1").await.unwrap();

        assert!(tracker.is_blocked("10.0.0.1").await.unwrap());
        assert!(!tracker.is_blocked("10.0.0.2").await.unwrap());
    }

    #[tokio::test]
    async fn test_clear_resets_counter() {
        let tracker = tracker(1);
        tracker.track("10.0.0.1").await.unwrap();
        assert!(tracker.is_blocked("10.0.0.1").await.unwrap());

        tracker.clear("10.0.0.1").await.unwrap();
        assert!(!tracker.is_blocked("10.0.0.1").await.unwrap());
    }
}
