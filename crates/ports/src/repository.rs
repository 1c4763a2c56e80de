//! Repository trait 定义

use async_trait::async_trait;
use voyage_common::{PagedResult, Pagination, PrincipalId, VoucherId};
use voyage_domain_core::{ListingScope, Principal, Voucher, VoucherFilter};
use voyage_errors::AppResult;

/// 用户仓储
///
/// 只在 `UnitOfWork` 内使用；读到的是事务内的暂存视图。
#[async_trait]
pub trait PrincipalRepository: Send + Sync {
    async fn find_by_id(&self, id: &PrincipalId) -> AppResult<Option<Principal>>;

    async fn find_by_username(&self, username: &str) -> AppResult<Option<Principal>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Principal>>;

    async fn exists_by_username(&self, username: &str) -> AppResult<bool>;

    async fn exists_by_email(&self, email: &str) -> AppResult<bool>;

    /// 新增或整体覆盖
    async fn save(&self, principal: &Principal) -> AppResult<()>;

    /// 按用户名更新密码哈希，返回是否命中
    async fn update_password(&self, username: &str, password_hash: &str) -> AppResult<bool>;
}

/// 代金券仓储
#[async_trait]
pub trait VoucherRepository: Send + Sync {
    async fn find_by_id(&self, id: &VoucherId) -> AppResult<Option<Voucher>>;

    async fn save(&self, voucher: &Voucher) -> AppResult<()>;

    /// 删除，返回是否存在
    async fn delete(&self, id: &VoucherId) -> AppResult<bool>;

    async fn exists(&self, id: &VoucherId) -> AppResult<bool>;

    /// 按可见范围 + 过滤条件分页查询
    async fn find_page(
        &self,
        scope: &ListingScope,
        filter: &VoucherFilter,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<Voucher>>;
}
