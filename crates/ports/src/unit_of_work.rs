//! Unit of Work trait 定义

use async_trait::async_trait;
use voyage_errors::AppResult;

use crate::{PrincipalRepository, VoucherRepository};

/// Unit of Work trait
///
/// 一次业务操作内的全部写入要么一起提交，要么全部丢弃。
/// 未调用 `commit` 就被 drop 视为回滚。
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// 获取用户 Repository
    fn principals(&self) -> &dyn PrincipalRepository;

    /// 获取代金券 Repository
    fn vouchers(&self) -> &dyn VoucherRepository;

    /// 提交事务
    async fn commit(self: Box<Self>) -> AppResult<()>;

    /// 回滚事务
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

/// Unit of Work 工厂
#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync {
    /// 开始事务
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>>;
}
