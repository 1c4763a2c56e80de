//! Transactional repositories
//!
//! These repositories operate on the staged copy of a `MemoryUnitOfWork`.

use async_trait::async_trait;
use voyage_common::{PagedResult, Pagination, PrincipalId, VoucherId};
use voyage_domain_core::{ListingScope, Principal, Voucher, VoucherFilter};
use voyage_errors::{AppError, AppResult};
use voyage_ports::{PrincipalRepository, VoucherRepository};

use super::memory_store::{SharedTx, with_staged};

/// Macro to define a TxRepository structure
macro_rules! define_tx_repo {
    ($name:ident) => {
        pub struct $name {
            tx: SharedTx,
        }

        impl $name {
            pub fn new(tx: SharedTx) -> Self {
                Self { tx }
            }
        }
    };
}

define_tx_repo!(TxPrincipalRepository);
define_tx_repo!(TxVoucherRepository);

/// 空邮箱（OAuth 未提供）不参与比较
fn same_email(a: &str, b: &str) -> bool {
    !a.is_empty() && a.eq_ignore_ascii_case(b)
}

#[async_trait]
impl PrincipalRepository for TxPrincipalRepository {
    async fn find_by_id(&self, id: &PrincipalId) -> AppResult<Option<Principal>> {
        with_staged(&self.tx, |t| t.principals.get(id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> AppResult<Option<Principal>> {
        with_staged(&self.tx, |t| {
            t.principals
                .values()
                .find(|p| p.username == username)
                .cloned()
        })
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<Principal>> {
        with_staged(&self.tx, |t| {
            t.principals
                .values()
                .find(|p| same_email(&p.email, email))
                .cloned()
        })
    }

    async fn exists_by_username(&self, username: &str) -> AppResult<bool> {
        with_staged(&self.tx, |t| {
            t.principals.values().any(|p| p.username == username)
        })
    }

    async fn exists_by_email(&self, email: &str) -> AppResult<bool> {
        with_staged(&self.tx, |t| {
            t.principals.values().any(|p| same_email(&p.email, email))
        })
    }

    async fn save(&self, principal: &Principal) -> AppResult<()> {
        with_staged(&self.tx, |t| {
            // 唯一约束：username / email
            let clash = t.principals.values().find(|p| {
                p.id != principal.id
                    && (p.username == principal.username || same_email(&p.email, &principal.email))
            });
            if let Some(existing) = clash {
                let field = if existing.username == principal.username {
                    "username"
                } else {
                    "email"
                };
                return Err(AppError::already_in_use(format!("{} is already taken", field)));
            }

            t.principals.insert(principal.id, principal.clone());
            Ok(())
        })?
    }

    async fn update_password(&self, username: &str, password_hash: &str) -> AppResult<bool> {
        with_staged(&self.tx, |t| {
            match t.principals.values_mut().find(|p| p.username == username) {
                Some(principal) => {
                    principal.password_hash = password_hash.to_string();
                    true
                }
                None => false,
            }
        })
    }
}

#[async_trait]
impl VoucherRepository for TxVoucherRepository {
    async fn find_by_id(&self, id: &VoucherId) -> AppResult<Option<Voucher>> {
        with_staged(&self.tx, |t| t.vouchers.get(id).cloned())
    }

    async fn save(&self, voucher: &Voucher) -> AppResult<()> {
        if !voucher.is_consistent() {
            return Err(AppError::internal(format!(
                "Voucher {} has status {} but owner {:?}",
                voucher.id, voucher.status, voucher.owner
            )));
        }
        with_staged(&self.tx, |t| {
            t.vouchers.insert(voucher.id, voucher.clone());
        })
    }

    async fn delete(&self, id: &VoucherId) -> AppResult<bool> {
        with_staged(&self.tx, |t| t.vouchers.remove(id).is_some())
    }

    async fn exists(&self, id: &VoucherId) -> AppResult<bool> {
        with_staged(&self.tx, |t| t.vouchers.contains_key(id))
    }

    async fn find_page(
        &self,
        scope: &ListingScope,
        filter: &VoucherFilter,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<Voucher>> {
        with_staged(&self.tx, |t| {
            let mut matched: Vec<&Voucher> = t
                .vouchers
                .values()
                .filter(|v| scope.admits(v) && filter.matches(v))
                .collect();
            matched.sort_by(|a, b| scope.compare(a, b));

            let total = matched.len() as u64;
            let items: Vec<Voucher> = pagination
                .slice(&matched)
                .into_iter()
                .cloned()
                .collect();

            PagedResult::new(items, total, pagination)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::{MemoryStore, MemoryUnitOfWorkFactory};
    use super::*;
    use voyage_domain_core::{HotelType, Money, TourType, TransferType, VoucherStatus};
    use voyage_ports::UnitOfWorkFactory;

    fn voucher(title: &str, price: u64) -> Voucher {
        Voucher::new(
            title,
            Money::from_units(price),
            TourType::Leisure,
            TransferType::Bus,
            HotelType::ThreeStars,
        )
    }

    #[tokio::test]
    async fn test_save_enforces_unique_username_and_email() {
        let factory = MemoryUnitOfWorkFactory::new(MemoryStore::new());
        let uow = factory.begin().await.unwrap();

        let alice = Principal::new_local("alice", "alice@example.com", "hash");
        uow.principals().save(&alice).await.unwrap();

        let same_name = Principal::new_local("alice", "other@example.com", "hash");
        assert!(matches!(
            uow.principals().save(&same_name).await,
            Err(AppError::AlreadyInUse(_))
        ));

        let same_email = Principal::new_local("alicia", "ALICE@example.com", "hash");
        assert!(matches!(
            uow.principals().save(&same_email).await,
            Err(AppError::AlreadyInUse(_))
        ));

        // 覆盖自身不算冲突
        uow.principals().save(&alice).await.unwrap();
    }

    #[tokio::test]
    async fn test_update_password_by_username() {
        let factory = MemoryUnitOfWorkFactory::new(MemoryStore::new());
        let uow = factory.begin().await.unwrap();
        let alice = Principal::new_local("alice", "alice@example.com", "old");
        uow.principals().save(&alice).await.unwrap();

        assert!(uow.principals().update_password("alice", "new").await.unwrap());
        assert!(!uow.principals().update_password("nobody", "new").await.unwrap());

        let stored = uow.principals().find_by_id(&alice.id).await.unwrap().unwrap();
        assert_eq!(stored.password_hash, "new");
    }

    #[tokio::test]
    async fn test_save_rejects_inconsistent_voucher() {
        let factory = MemoryUnitOfWorkFactory::new(MemoryStore::new());
        let uow = factory.begin().await.unwrap();

        let mut broken = voucher("Broken", 10);
        broken.status = VoucherStatus::Paid;

        assert!(uow.vouchers().save(&broken).await.is_err());
    }

    #[tokio::test]
    async fn test_find_page_filters_sorts_and_pages() {
        let factory = MemoryUnitOfWorkFactory::new(MemoryStore::new());
        let uow = factory.begin().await.unwrap();

        for (title, price) in [("Charlie", 30), ("Alpha", 10), ("Bravo", 20)] {
            uow.vouchers().save(&voucher(title, price)).await.unwrap();
        }
        let mut sold = voucher("Sold", 5);
        sold.assign_to(PrincipalId::new());
        uow.vouchers().save(&sold).await.unwrap();

        let page = uow
            .vouchers()
            .find_page(
                &ListingScope::Admin,
                &VoucherFilter::default(),
                &Pagination::new(1, 2),
            )
            .await
            .unwrap();
        assert_eq!(page.total, 4);
        assert_eq!(page.items.len(), 2);

        let filter = VoucherFilter {
            min_price: Some(Money::from_units(15)),
            ..Default::default()
        };
        let page = uow
            .vouchers()
            .find_page(&ListingScope::Catalog, &filter, &Pagination::default())
            .await
            .unwrap();
        let titles: Vec<_> = page.items.iter().map(|v| v.title.as_str()).collect();
        assert_eq!(page.total, 2);
        assert!(titles.contains(&"Bravo") && titles.contains(&"Charlie"));
    }
}
