//! SessionStore trait 定义

use async_trait::async_trait;
use std::time::Duration;
use voyage_errors::AppResult;

/// 带过期的键值会话存储
///
/// 每种用途（刷新令牌、重置令牌、失败计数、用户缓存、列表缓存）各自一个实例，
/// 互不共享键空间。单次调用是线程安全的，跨调用的读-改-写不保证原子。
#[async_trait]
pub trait SessionStore<V>: Send + Sync
where
    V: Clone + Send + Sync + 'static,
{
    /// 写入（覆盖），使用实例默认 TTL
    async fn store(&self, key: &str, value: V) -> AppResult<()>;

    /// 写入（覆盖），单条目 TTL
    async fn store_for(&self, key: &str, value: V, ttl: Duration) -> AppResult<()>;

    /// 读取；未命中返回 None
    async fn get(&self, key: &str) -> AppResult<Option<V>>;

    /// 删除；键不存在时不报错
    async fn revoke(&self, key: &str) -> AppResult<()>;

    /// 清空本实例全部条目
    async fn clear_all(&self) -> AppResult<()>;
}
