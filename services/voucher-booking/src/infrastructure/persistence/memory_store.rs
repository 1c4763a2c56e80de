//! 内存存储与 Unit of Work 实现

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::debug;
use voyage_common::{PrincipalId, VoucherId};
use voyage_domain_core::{Principal, Voucher};
use voyage_errors::{AppError, AppResult};
use voyage_ports::{
    PrincipalRepository, UnitOfWork, UnitOfWorkFactory, VoucherRepository,
};

use super::tx_repositories::{TxPrincipalRepository, TxVoucherRepository};

/// 全部表
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub principals: HashMap<PrincipalId, Principal>,
    pub vouchers: HashMap<VoucherId, Voucher>,
}

/// 进程内存储
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<AsyncMutex<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 已提交数据的副本（会等待进行中的事务结束）
    pub async fn snapshot(&self) -> Tables {
        self.tables.lock().await.clone()
    }
}

/// 进行中的事务：持有存储锁 + 暂存副本
pub struct Staged {
    guard: OwnedMutexGuard<Tables>,
    pub(crate) tables: Tables,
}

/// Shared transaction type
pub type SharedTx = Arc<Mutex<Option<Staged>>>;

/// 在暂存副本上执行操作
pub(crate) fn with_staged<R>(tx: &SharedTx, f: impl FnOnce(&mut Tables) -> R) -> AppResult<R> {
    let mut guard = tx.lock();
    let staged = guard
        .as_mut()
        .ok_or_else(|| AppError::internal("Transaction consumed"))?;
    Ok(f(&mut staged.tables))
}

/// 内存 Unit of Work 工厂
#[derive(Clone)]
pub struct MemoryUnitOfWorkFactory {
    store: MemoryStore,
}

impl MemoryUnitOfWorkFactory {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl UnitOfWorkFactory for MemoryUnitOfWorkFactory {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let guard = self.store.tables.clone().lock_owned().await;
        let tables = guard.clone();

        Ok(Box::new(MemoryUnitOfWork::new(Staged { guard, tables })))
    }
}

/// 内存 Unit of Work 实现
///
/// drop 而未提交时暂存副本被丢弃，锁随之释放。
pub struct MemoryUnitOfWork {
    tx: SharedTx,
    principal_repo: TxPrincipalRepository,
    voucher_repo: TxVoucherRepository,
}

impl MemoryUnitOfWork {
    fn new(staged: Staged) -> Self {
        let tx = Arc::new(Mutex::new(Some(staged)));

        Self {
            tx: tx.clone(),
            principal_repo: TxPrincipalRepository::new(tx.clone()),
            voucher_repo: TxVoucherRepository::new(tx),
        }
    }

    fn take(&self, action: &str) -> AppResult<Staged> {
        self.tx
            .lock()
            .take()
            .ok_or_else(|| AppError::internal(format!("Cannot {}: transaction already consumed", action)))
    }
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    fn principals(&self) -> &dyn PrincipalRepository {
        &self.principal_repo
    }

    fn vouchers(&self) -> &dyn VoucherRepository {
        &self.voucher_repo
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let Staged { mut guard, tables } = self.take("commit")?;
        *guard = tables;
        debug!("Transaction committed");
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        self.take("rollback")?;
        debug!("Transaction rolled back");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voyage_domain_core::Money;

    #[tokio::test]
    async fn test_commit_publishes_staged_writes() {
        let store = MemoryStore::new();
        let factory = MemoryUnitOfWorkFactory::new(store.clone());
        let principal = Principal::new_local("alice", "alice@example.com", "hash");

        let uow = factory.begin().await.unwrap();
        uow.principals().save(&principal).await.unwrap();
        uow.commit().await.unwrap();

        assert!(store.snapshot().await.principals.contains_key(&principal.id));
    }

    #[tokio::test]
    async fn test_drop_without_commit_discards_writes() {
        let store = MemoryStore::new();
        let factory = MemoryUnitOfWorkFactory::new(store.clone());
        let principal = Principal::new_local("bob", "bob@example.com", "hash")
            .with_balance(Money::from_units(5));

        {
            let uow = factory.begin().await.unwrap();
            uow.principals().save(&principal).await.unwrap();
        }

        assert!(store.snapshot().await.principals.is_empty());

        let uow = factory.begin().await.unwrap();
        uow.principals().save(&principal).await.unwrap();
        uow.rollback().await.unwrap();

        assert!(store.snapshot().await.principals.is_empty());
    }

    #[tokio::test]
    async fn test_reads_inside_transaction_see_staged_writes() {
        let factory = MemoryUnitOfWorkFactory::new(MemoryStore::new());
        let principal = Principal::new_local("carol", "carol@example.com", "hash");

        let uow = factory.begin().await.unwrap();
        uow.principals().save(&principal).await.unwrap();

        let found = uow.principals().find_by_username("carol").await.unwrap();
        assert_eq!(found.map(|p| p.id), Some(principal.id));
    }
}
