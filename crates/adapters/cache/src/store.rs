//! Moka SessionStore 实现

use async_trait::async_trait;
use moka::Expiry;
use moka::future::Cache as MokaCache;
use std::time::{Duration, Instant};
use voyage_config::StorePolicy;
use voyage_errors::AppResult;
use voyage_ports::SessionStore;

#[derive(Clone)]
struct Slot<V> {
    value: V,
    ttl: Option<Duration>,
}

/// 条目级过期：覆盖写入时重新计时
struct SlotExpiry;

impl<V> Expiry<String, Slot<V>> for SlotExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        slot: &Slot<V>,
        _created_at: Instant,
    ) -> Option<Duration> {
        slot.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        slot: &Slot<V>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        slot.ttl
    }
}

/// 命名的 moka 会话存储
#[derive(Clone)]
pub struct MokaSessionStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    name: &'static str,
    default_ttl: Option<Duration>,
    cache: MokaCache<String, Slot<V>>,
}

impl<V> MokaSessionStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str, policy: StorePolicy) -> Self {
        let cache = MokaCache::builder()
            .name(name)
            .max_capacity(policy.max_capacity)
            .expire_after(SlotExpiry)
            .build();

        tracing::debug!(
            store = name,
            ttl_secs = ?policy.ttl_secs,
            max_capacity = policy.max_capacity,
            "Session store created"
        );

        Self {
            name,
            default_ttl: policy.ttl_secs.map(Duration::from_secs),
            cache,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 近似条目数（包含尚未清理的过期条目）
    pub async fn len(&self) -> u64 {
        self.cache.run_pending_tasks().await;
        self.cache.entry_count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    async fn put(&self, key: &str, value: V, ttl: Option<Duration>) {
        self.cache
            .insert(key.to_string(), Slot { value, ttl })
            .await;
    }
}

#[async_trait]
impl<V> SessionStore<V> for MokaSessionStore<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn store(&self, key: &str, value: V) -> AppResult<()> {
        self.put(key, value, self.default_ttl).await;
        tracing::trace!(store = self.name, key = %key, "Stored entry");
        Ok(())
    }

    async fn store_for(&self, key: &str, value: V, ttl: Duration) -> AppResult<()> {
        self.put(key, value, Some(ttl)).await;
        tracing::trace!(store = self.name, key = %key, ttl_secs = ttl.as_secs(), "Stored entry");
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<Option<V>> {
        let hit = self.cache.get(key).await.map(|slot| slot.value);
        tracing::trace!(store = self.name, key = %key, hit = hit.is_some(), "Lookup");
        Ok(hit)
    }

    async fn revoke(&self, key: &str) -> AppResult<()> {
        self.cache.invalidate(key).await;
        Ok(())
    }

    async fn clear_all(&self) -> AppResult<()> {
        self.cache.invalidate_all();
        tracing::debug!(store = self.name, "Cleared all entries");
        Ok(())
    }
}
