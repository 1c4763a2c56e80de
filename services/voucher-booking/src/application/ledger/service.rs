//! 代金券账本服务
//!
//! 余额、持有人、状态三处写入在同一个 Unit of Work 中提交。
//! 任何写操作之后整体清空列表缓存。

use metrics::counter;
use std::sync::Arc;
use tracing::{debug, info, warn};
use voyage_common::{PagedResult, Pagination, PrincipalId, VoucherId};
use voyage_domain_core::{ListingScope, Voucher, VoucherFilter, VoucherStatus};
use voyage_errors::{AppError, AppResult};
use voyage_ports::{UnitOfWork, UnitOfWorkFactory};

use super::commands::{NewVoucher, StatusRequest, VoucherPatch};
use crate::application::profile::ProfileService;
use crate::application::stores::{CacheGeneration, VoucherPageStore};

/// 默认查询（无过滤条件）的缓存键
pub fn listing_cache_key(scope: &ListingScope, pagination: &Pagination) -> String {
    match scope {
        ListingScope::Catalog => {
            format!("vouchers_p{}_s{}", pagination.page, pagination.page_size)
        }
        ListingScope::Owner(owner) => format!(
            "user_vouchers_id{}_p{}_s{}",
            owner, pagination.page, pagination.page_size
        ),
        ListingScope::Admin => {
            format!("admin_vouchers_p{}_s{}", pagination.page, pagination.page_size)
        }
    }
}

/// 代金券账本
#[derive(Clone)]
pub struct VoucherLedger {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
    pages: VoucherPageStore,
    generation: CacheGeneration,
    profiles: ProfileService,
}

async fn load_voucher(uow: &dyn UnitOfWork, id: &VoucherId) -> AppResult<Voucher> {
    uow.vouchers()
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Voucher {} not found", id)))
}

impl VoucherLedger {
    pub fn new(
        uow_factory: Arc<dyn UnitOfWorkFactory>,
        pages: VoucherPageStore,
        profiles: ProfileService,
    ) -> Self {
        Self {
            uow_factory,
            pages,
            generation: CacheGeneration::default(),
            profiles,
        }
    }

    async fn invalidate_listings(&self) -> AppResult<()> {
        self.generation.bump();
        self.pages.clear_all().await
    }

    pub async fn create(&self, request: NewVoucher) -> AppResult<Voucher> {
        let voucher = request.into_voucher()?;

        let uow = self.uow_factory.begin().await?;
        uow.vouchers().save(&voucher).await?;
        uow.commit().await?;

        self.invalidate_listings().await?;
        info!(voucher_id = %voucher.id, title = %voucher.title, "Voucher created");
        Ok(voucher)
    }

    pub async fn update(&self, id: VoucherId, patch: VoucherPatch) -> AppResult<Voucher> {
        let uow = self.uow_factory.begin().await?;
        let mut voucher = load_voucher(uow.as_ref(), &id).await?;

        patch.apply(&mut voucher)?;
        uow.vouchers().save(&voucher).await?;
        uow.commit().await?;

        self.invalidate_listings().await?;
        info!(voucher_id = %id, "Voucher updated");
        Ok(voucher)
    }

    pub async fn delete(&self, id: VoucherId) -> AppResult<()> {
        let uow = self.uow_factory.begin().await?;
        if !uow.vouchers().delete(&id).await? {
            return Err(AppError::not_found(format!("Voucher {} not found", id)));
        }
        uow.commit().await?;

        self.invalidate_listings().await?;
        info!(voucher_id = %id, "Voucher deleted");
        Ok(())
    }

    pub async fn get_by_id(&self, id: VoucherId) -> AppResult<Voucher> {
        let uow = self.uow_factory.begin().await?;
        load_voucher(uow.as_ref(), &id).await
    }

    /// 下单：扣款、设置持有人、登记
    pub async fn order(&self, voucher_id: VoucherId, principal_id: PrincipalId) -> AppResult<Voucher> {
        let result = self.order_in_tx(voucher_id, principal_id).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(AppError::NotEnoughBalance) => "not_enough_balance",
            Err(AppError::AlreadyInUse(_)) => "already_taken",
            Err(AppError::NotFound(_)) => "not_found",
            Err(_) => "error",
        };
        counter!("ledger_order_total", "outcome" => outcome).increment(1);

        let (voucher, username) = result?;
        self.profiles.evict(&principal_id, &username).await?;
        self.invalidate_listings().await?;

        Ok(voucher)
    }

    async fn order_in_tx(
        &self,
        voucher_id: VoucherId,
        principal_id: PrincipalId,
    ) -> AppResult<(Voucher, String)> {
        let uow = self.uow_factory.begin().await?;

        let mut voucher = load_voucher(uow.as_ref(), &voucher_id).await?;
        let mut principal = uow
            .principals()
            .find_by_id(&principal_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {} not found", principal_id)))?;

        if voucher.is_owned() {
            warn!(voucher_id = %voucher_id, user_id = %principal_id, "Voucher already taken");
            return Err(AppError::already_in_use("voucher is already taken"));
        }

        info!(
            voucher_id = %voucher_id,
            user_id = %principal_id,
            price = %voucher.price,
            "Processing voucher payment"
        );

        if !principal.try_debit(voucher.price) {
            warn!(
                voucher_id = %voucher_id,
                user_id = %principal_id,
                balance = %principal.balance,
                price = %voucher.price,
                "Not enough balance"
            );
            return Err(AppError::NotEnoughBalance);
        }
        voucher.assign_to(principal.id);

        uow.principals().save(&principal).await?;
        uow.vouchers().save(&voucher).await?;
        uow.commit().await?;

        info!(
            voucher_id = %voucher_id,
            user_id = %principal_id,
            balance = %principal.balance,
            "Voucher payment completed"
        );
        Ok((voucher, principal.username))
    }

    /// 状态流转
    ///
    /// - CREATED：解除持有人，不退款
    /// - CANCELED：有持有人时退款并解除持有人
    /// - REGISTERED / PAID：只改状态，必须已有持有人
    pub async fn change_status(&self, voucher_id: VoucherId, request: StatusRequest) -> AppResult<Voucher> {
        let target = request
            .status
            .as_deref()
            .map(|s| {
                s.parse::<VoucherStatus>()
                    .map_err(|_| AppError::invalid_status(format!("Status {} is not valid", s)))
            })
            .transpose()?;

        let uow = self.uow_factory.begin().await?;
        let mut voucher = load_voucher(uow.as_ref(), &voucher_id).await?;
        let mut refunded = None;

        if let Some(target) = target {
            match target {
                VoucherStatus::Created => {
                    voucher.detach();
                }
                VoucherStatus::Canceled => {
                    if let Some(owner_id) = voucher.detach() {
                        let mut owner = uow
                            .principals()
                            .find_by_id(&owner_id)
                            .await?
                            .ok_or_else(|| {
                                AppError::internal(format!(
                                    "Voucher {} owned by missing user {}",
                                    voucher_id, owner_id
                                ))
                            })?;
                        owner.credit(voucher.price);
                        uow.principals().save(&owner).await?;
                        refunded = Some(owner);
                    }
                }
                VoucherStatus::Registered | VoucherStatus::Paid => {
                    if !voucher.is_owned() {
                        return Err(AppError::invalid_status(format!(
                            "Status {} requires an owner",
                            target
                        )));
                    }
                }
            }
            voucher.status = target;
        }

        if let Some(is_hot) = request.is_hot {
            voucher.is_hot = is_hot;
        }

        uow.vouchers().save(&voucher).await?;
        uow.commit().await?;

        if let Some(owner) = refunded {
            self.profiles.evict(&owner.id, &owner.username).await?;
            counter!("ledger_refund_total").increment(1);
            info!(
                voucher_id = %voucher_id,
                user_id = %owner.id,
                amount = %voucher.price,
                balance = %owner.balance,
                "Voucher canceled and refunded"
            );
        }

        self.invalidate_listings().await?;
        info!(voucher_id = %voucher_id, status = %voucher.status, is_hot = voucher.is_hot, "Voucher status changed");
        Ok(voucher)
    }

    /// 公开目录
    pub async fn find_with_filters(
        &self,
        filter: &VoucherFilter,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<Voucher>> {
        self.find_page(ListingScope::Catalog, filter, pagination).await
    }

    /// 某个用户持有的代金券
    pub async fn find_by_owner(
        &self,
        owner: PrincipalId,
        filter: &VoucherFilter,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<Voucher>> {
        self.find_page(ListingScope::Owner(owner), filter, pagination)
            .await
    }

    /// 管理视图
    pub async fn find_admin(
        &self,
        filter: &VoucherFilter,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<Voucher>> {
        self.find_page(ListingScope::Admin, filter, pagination).await
    }

    /// 只有默认查询读写缓存；任何过滤条件都直接查库
    async fn find_page(
        &self,
        scope: ListingScope,
        filter: &VoucherFilter,
        pagination: &Pagination,
    ) -> AppResult<PagedResult<Voucher>> {
        let cache_key = filter
            .is_empty()
            .then(|| listing_cache_key(&scope, pagination));

        if let Some(key) = &cache_key {
            if let Some(page) = self.pages.get(key).await? {
                debug!(key = %key, "Listing cache hit");
                return Ok(page);
            }
        }

        let seen = self.generation.current();
        let uow = self.uow_factory.begin().await?;
        let page = uow.vouchers().find_page(&scope, filter, pagination).await?;
        drop(uow);

        if let Some(key) = &cache_key {
            self.pages.store(key, page.clone()).await?;
            if self.generation.changed_since(seen) {
                // 读取期间有写操作清空了缓存，这一页可能已过期
                self.pages.revoke(key).await?;
                debug!(key = %key, "Listing invalidated during read, not cached");
            }
        }
        Ok(page)
    }
}
