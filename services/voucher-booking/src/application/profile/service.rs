//! 用户资料服务

use std::sync::Arc;
use tracing::{debug, info};
use voyage_common::PrincipalId;
use voyage_domain_core::{Money, Principal, PrincipalProfile};
use voyage_errors::{AppError, AppResult};
use voyage_ports::UnitOfWorkFactory;

use crate::application::stores::{CacheGeneration, ProfileStore, RefreshTokenStore};

fn id_key(id: &PrincipalId) -> String {
    format!("user:id:{}", id)
}

fn username_key(username: &str) -> String {
    format!("user:name:{}", username)
}

/// 用户资料服务
///
/// 快照同时以 id 和用户名为键缓存；任何修改余额或状态的操作都要调用 `evict`。
#[derive(Clone)]
pub struct ProfileService {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
    cache: ProfileStore,
    generation: CacheGeneration,
    refresh_tokens: RefreshTokenStore,
}

impl ProfileService {
    pub fn new(
        uow_factory: Arc<dyn UnitOfWorkFactory>,
        cache: ProfileStore,
        refresh_tokens: RefreshTokenStore,
    ) -> Self {
        Self {
            uow_factory,
            cache,
            generation: CacheGeneration::default(),
            refresh_tokens,
        }
    }

    /// 写入两个键；`seen` 之后若有失效发生则撤回
    async fn remember(&self, profile: &PrincipalProfile, seen: u64) -> AppResult<()> {
        self.cache.store(&id_key(&profile.id), profile.clone()).await?;
        self.cache
            .store(&username_key(&profile.username), profile.clone())
            .await?;
        if self.generation.changed_since(seen) {
            self.cache.revoke(&id_key(&profile.id)).await?;
            self.cache.revoke(&username_key(&profile.username)).await?;
            debug!(user_id = %profile.id, "Profile evicted during read, not cached");
        }
        Ok(())
    }

    pub async fn get_by_id(&self, id: PrincipalId) -> AppResult<PrincipalProfile> {
        if let Some(profile) = self.cache.get(&id_key(&id)).await? {
            debug!(user_id = %id, "Profile cache hit");
            return Ok(profile);
        }

        let seen = self.generation.current();
        let uow = self.uow_factory.begin().await?;
        let principal = uow.principals().find_by_id(&id).await?;
        drop(uow);

        let profile = principal
            .ok_or_else(|| AppError::not_found(format!("User {} not found", id)))?
            .profile();
        self.remember(&profile, seen).await?;
        Ok(profile)
    }

    pub async fn get_by_username(&self, username: &str) -> AppResult<PrincipalProfile> {
        if let Some(profile) = self.cache.get(&username_key(username)).await? {
            debug!(username = %username, "Profile cache hit");
            return Ok(profile);
        }

        let seen = self.generation.current();
        let uow = self.uow_factory.begin().await?;
        let principal = uow.principals().find_by_username(username).await?;
        drop(uow);

        let profile = principal
            .ok_or_else(|| AppError::not_found(format!("User {} not found", username)))?
            .profile();
        self.remember(&profile, seen).await?;
        Ok(profile)
    }

    /// 移除某个用户的全部缓存键
    pub async fn evict(&self, id: &PrincipalId, username: &str) -> AppResult<()> {
        self.generation.bump();
        self.cache.revoke(&id_key(id)).await?;
        self.cache.revoke(&username_key(username)).await?;
        debug!(user_id = %id, "Profile cache evicted");
        Ok(())
    }

    /// 充值
    pub async fn top_up(&self, id: PrincipalId, amount: Money) -> AppResult<PrincipalProfile> {
        if !amount.is_positive() {
            return Err(AppError::validation("Top-up amount must be positive"));
        }

        let principal = self
            .modify(id, |principal| {
                principal.credit(amount);
                Ok(())
            })
            .await?;

        info!(user_id = %id, amount = %amount, balance = %principal.balance, "Balance topped up");
        Ok(principal.profile())
    }

    /// 启用 / 停用账户；停用会同时吊销刷新令牌
    pub async fn set_active(&self, id: PrincipalId, active: bool) -> AppResult<PrincipalProfile> {
        let principal = self
            .modify(id, |principal| {
                principal.active = active;
                Ok(())
            })
            .await?;

        if !active {
            self.refresh_tokens.revoke(&id.to_string()).await?;
        }

        info!(user_id = %id, active, "Account status changed");
        Ok(principal.profile())
    }

    async fn modify(
        &self,
        id: PrincipalId,
        change: impl FnOnce(&mut Principal) -> AppResult<()> + Send,
    ) -> AppResult<Principal> {
        let uow = self.uow_factory.begin().await?;
        let mut principal = uow
            .principals()
            .find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {} not found", id)))?;

        change(&mut principal)?;
        uow.principals().save(&principal).await?;
        uow.commit().await?;

        self.evict(&principal.id, &principal.username).await?;
        Ok(principal)
    }
}
