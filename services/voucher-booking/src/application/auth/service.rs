//! 认证服务
//!
//! 登录、注册、刷新、登出、密码重置与 OAuth2 登录完成。
//! 每个成功的认证事件都会轮换刷新令牌：先吊销旧值，再写入新值。
//! 两步之间不加锁，并发刷新时后写者胜出。

use chrono::Duration;
use email_address::EmailAddress;
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use voyage_auth_core::{TokenCodec, TokenKind, TokenPair};
use voyage_common::Clock;
use voyage_config::PasswordResetConfig;
use voyage_domain_core::{Principal, PrincipalProfile};
use voyage_errors::{AppError, AppResult};
use voyage_ports::{Notifier, PasswordHasher, UnitOfWorkFactory};

use super::attempts::AttemptTracker;
use super::reset::{
    ResetChannel, ResetTicket, build_reset_link, generate_reset_token, reset_store_key,
};
use crate::application::oauth::{OAuthAttributes, OAuthLinker};
use crate::application::profile::ProfileService;
use crate::application::stores::{RefreshTokenStore, ResetTokenStore};

const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;

/// 登录请求
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// 注册请求
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
}

/// 认证成功的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub principal: PrincipalProfile,
}

/// 认证服务依赖
pub struct AuthDependencies {
    pub uow_factory: Arc<dyn UnitOfWorkFactory>,
    pub codec: Arc<TokenCodec>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
    pub refresh_tokens: RefreshTokenStore,
    pub reset_tokens: ResetTokenStore,
    pub attempts: AttemptTracker,
    pub profiles: ProfileService,
    pub linker: OAuthLinker,
    pub reset_config: PasswordResetConfig,
}

/// 认证服务
pub struct AuthService {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
    codec: Arc<TokenCodec>,
    hasher: Arc<dyn PasswordHasher>,
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    refresh_tokens: RefreshTokenStore,
    reset_tokens: ResetTokenStore,
    attempts: AttemptTracker,
    profiles: ProfileService,
    linker: OAuthLinker,
    reset_config: PasswordResetConfig,
}

impl AuthService {
    pub fn new(deps: AuthDependencies) -> Self {
        Self {
            uow_factory: deps.uow_factory,
            codec: deps.codec,
            hasher: deps.hasher,
            notifier: deps.notifier,
            clock: deps.clock,
            refresh_tokens: deps.refresh_tokens,
            reset_tokens: deps.reset_tokens,
            attempts: deps.attempts,
            profiles: deps.profiles,
            linker: deps.linker,
            reset_config: deps.reset_config,
        }
    }

    /// 用户名密码登录
    ///
    /// `client_ip` 存在时参与失败锁定。
    pub async fn login(
        &self,
        request: LoginRequest,
        client_ip: Option<&str>,
    ) -> AppResult<AuthSession> {
        if let Some(ip) = client_ip {
            if self.attempts.is_blocked(ip).await? {
                counter!("auth_login_total", "outcome" => "blocked").increment(1);
                warn!(ip = %ip, "Login rejected: too many failed attempts");
                return Err(AppError::TooManyAttempts);
            }
        }

        let uow = self.uow_factory.begin().await?;
        let principal = uow.principals().find_by_username(&request.username).await?;
        drop(uow);

        let principal = match principal {
            Some(p) if self.hasher.verify(&request.password, &p.password_hash) => p,
            _ => {
                if let Some(ip) = client_ip {
                    let failures = self.attempts.track(ip).await?;
                    warn!(ip = %ip, failures, "Login failed: bad credentials");
                } else {
                    warn!("Login failed: bad credentials");
                }
                counter!("auth_login_total", "outcome" => "bad_credentials").increment(1);
                return Err(AppError::BadCredentials);
            }
        };

        if !principal.is_active() {
            counter!("auth_login_total", "outcome" => "disabled").increment(1);
            warn!(user_id = %principal.id, "Login rejected: account disabled");
            return Err(AppError::AccountDisabled);
        }

        if let Some(ip) = client_ip {
            self.attempts.clear(ip).await?;
        }

        let session = self.issue_session(principal.profile()).await?;
        counter!("auth_login_total", "outcome" => "success").increment(1);
        info!(user_id = %session.principal.id, "User logged in");
        Ok(session)
    }

    /// 本地注册：角色 USER、来源 LOCAL、启用
    pub async fn register(&self, request: RegisterRequest) -> AppResult<AuthSession> {
        validate_registration(&request)?;

        // 哈希放在事务外，避免长时间持有存储锁
        let password_hash = self.hasher.hash(&request.password)?;

        let uow = self.uow_factory.begin().await?;
        if uow.principals().exists_by_username(&request.username).await? {
            return Err(AppError::already_in_use("username is already taken"));
        }
        if uow.principals().exists_by_email(&request.email).await? {
            return Err(AppError::already_in_use("email is already taken"));
        }

        let mut principal = Principal::new_local(request.username, request.email, password_hash)
            .with_names(request.first_name, request.last_name);
        principal.phone_number = request.phone_number;

        uow.principals().save(&principal).await?;
        uow.commit().await?;

        info!(user_id = %principal.id, username = %principal.username, "User registered");
        self.issue_session(principal.profile()).await
    }

    /// 用刷新令牌换取新的令牌对
    ///
    /// 先检查存储中是否存在该令牌，再检查过期。
    pub async fn refresh(&self, refresh_token: &str) -> AppResult<AuthSession> {
        let claims = self.codec.decode(refresh_token).map_err(|e| {
            counter!("auth_refresh_total", "outcome" => "invalid").increment(1);
            AppError::from(e)
        })?;

        let principal_id = claims
            .principal_id()
            .filter(|_| claims.is_kind(TokenKind::Refresh))
            .ok_or(AppError::InvalidToken)?;

        let stored = self.refresh_tokens.get(&principal_id.to_string()).await?;
        if stored.as_deref() != Some(refresh_token) {
            counter!("auth_refresh_total", "outcome" => "invalid").increment(1);
            debug!(user_id = %principal_id, "Refresh token not in store");
            return Err(AppError::InvalidToken);
        }

        if self.codec.is_expired(&claims) {
            counter!("auth_refresh_total", "outcome" => "expired").increment(1);
            return Err(AppError::ExpiredToken);
        }

        let uow = self.uow_factory.begin().await?;
        let principal = uow.principals().find_by_id(&principal_id).await?;
        drop(uow);

        let principal = principal.ok_or(AppError::InvalidToken)?;
        if !principal.is_active() {
            return Err(AppError::AccountDisabled);
        }

        let session = self.issue_session(principal.profile()).await?;
        counter!("auth_refresh_total", "outcome" => "success").increment(1);
        debug!(user_id = %principal_id, "Refresh token rotated");
        Ok(session)
    }

    /// 登出：吊销 `id` 声明对应的刷新令牌；缺少 `id` 时什么都不做
    pub async fn logout(&self, refresh_token: &str) -> AppResult<()> {
        let id = self.codec.extract(refresh_token, "id")?;

        if let Some(id) = id {
            self.refresh_tokens.revoke(&id).await?;
            info!(user_id = %id, "User logged out");
        }
        Ok(())
    }

    /// 申请重置密码
    ///
    /// 邮箱不存在时同样返回成功，调用方无法据此探测账户。
    pub async fn reset_password_request(
        &self,
        email: &str,
        channel: ResetChannel,
    ) -> AppResult<()> {
        let uow = self.uow_factory.begin().await?;
        let principal = uow.principals().find_by_email(email).await?;
        drop(uow);

        let Some(principal) = principal else {
            debug!("Password reset requested for unknown email");
            return Ok(());
        };

        let ttl = Duration::seconds(self.reset_config.token_ttl_secs as i64);
        let token = generate_reset_token();
        let ticket = ResetTicket {
            profile: principal.profile(),
            expires_at: self.clock.now() + ttl,
        };
        self.reset_tokens
            .store_for(
                &reset_store_key(&token),
                ticket,
                std::time::Duration::from_secs(self.reset_config.token_ttl_secs),
            )
            .await?;

        let link = build_reset_link(&self.reset_config, channel, &token)?;
        let body = format!(
            "To reset your password, follow the link below. It expires in {} minutes.\n\n{}",
            ttl.num_minutes(),
            link
        );
        self.notifier
            .send_text(&principal.email, "Password reset", &body)
            .await;

        info!(user_id = %principal.id, channel = ?channel, "Password reset token issued");
        Ok(())
    }

    /// 校验重置令牌（链接落地时调用）
    pub async fn check_reset_token(&self, token: &str) -> AppResult<()> {
        self.live_ticket(token).await.map(|_| ())
    }

    async fn live_ticket(&self, token: &str) -> AppResult<ResetTicket> {
        let key = reset_store_key(token);
        let ticket = self
            .reset_tokens
            .get(&key)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if ticket.is_expired_at(self.clock.now()) {
            self.reset_tokens.revoke(&key).await?;
            return Err(AppError::InvalidToken);
        }
        Ok(ticket)
    }

    /// 确认重置：改密、销毁令牌、吊销现有会话
    pub async fn reset_password_confirm(&self, token: &str, new_password: &str) -> AppResult<()> {
        validate_password(new_password)?;

        let ticket = self.live_ticket(token).await?;
        let profile = ticket.profile;
        let password_hash = self.hasher.hash(new_password)?;

        let uow = self.uow_factory.begin().await?;
        if !uow
            .principals()
            .update_password(&profile.username, &password_hash)
            .await?
        {
            return Err(AppError::not_found(format!(
                "User {} no longer exists",
                profile.username
            )));
        }
        uow.commit().await?;

        self.reset_tokens.revoke(&reset_store_key(token)).await?;
        self.refresh_tokens.revoke(&profile.id.to_string()).await?;
        self.profiles.evict(&profile.id, &profile.username).await?;

        info!(user_id = %profile.id, "Password reset completed");
        Ok(())
    }

    /// 令牌结构合法且未过期
    pub fn validate_token(&self, token: &str) -> bool {
        !token.is_empty() && self.codec.is_valid(token)
    }

    /// OAuth2 登录成功：关联账户后按登录流程签发令牌
    pub async fn complete_oauth(
        &self,
        provider_name: &str,
        attributes: &OAuthAttributes,
    ) -> AppResult<AuthSession> {
        let principal = match self.linker.resolve(provider_name, attributes).await {
            Ok(principal) => principal,
            Err(e) => {
                counter!("auth_login_total", "outcome" => "oauth_rejected").increment(1);
                return Err(e);
            }
        };

        if !principal.is_active() {
            counter!("auth_login_total", "outcome" => "disabled").increment(1);
            return Err(AppError::AccountDisabled);
        }

        // 名字可能已更新
        self.profiles.evict(&principal.id, &principal.username).await?;

        let session = self.issue_session(principal.profile()).await?;
        counter!("auth_login_total", "outcome" => "oauth_success").increment(1);
        info!(user_id = %principal.id, provider = %principal.auth_provider, "OAuth2 login completed");
        Ok(session)
    }

    /// 签发令牌对并轮换刷新令牌
    async fn issue_session(&self, principal: PrincipalProfile) -> AppResult<AuthSession> {
        let TokenPair {
            access_token,
            refresh_token,
        } = self.codec.issue_pair((&principal).into())?;

        let key = principal.id.to_string();
        self.refresh_tokens.revoke(&key).await?;
        self.refresh_tokens.store(&key, refresh_token.clone()).await?;

        Ok(AuthSession {
            access_token,
            refresh_token,
            principal,
        })
    }
}

fn validate_password(password: &str) -> AppResult<()> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    if len > MAX_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at most {} characters",
            MAX_PASSWORD_LEN
        )));
    }
    Ok(())
}

fn validate_registration(request: &RegisterRequest) -> AppResult<()> {
    if request.username.trim().is_empty() {
        return Err(AppError::validation("Username must not be blank"));
    }
    if !EmailAddress::is_valid(&request.email) {
        return Err(AppError::validation("Invalid email format"));
    }
    validate_password(&request.password)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            first_name: None,
            last_name: None,
            phone_number: None,
        }
    }

    #[test]
    fn test_registration_validation() {
        assert!(validate_registration(&request("alice", "alice@example.com", "Passw0rd!")).is_ok());
        assert!(validate_registration(&request(" ", "alice@example.com", "Passw0rd!")).is_err());
        assert!(validate_registration(&request("alice", "not-an-email", "Passw0rd!")).is_err());
        assert!(validate_registration(&request("alice", "alice@example.com", "short")).is_err());
    }
}
