//! 组装应用状态

use std::sync::Arc;
use tracing::info;
use voyage_adapter_cache::{CacheType, MokaSessionStore};
use voyage_adapter_email::SmtpNotifier;
use voyage_auth_core::{TokenCodec, TokenCodecConfig};
use voyage_common::{Clock, SystemClock};
use voyage_config::AppConfig;
use voyage_errors::AppResult;
use voyage_ports::{Notifier, PasswordHasher, SessionStore, UnitOfWorkFactory};

use crate::application::auth::{AttemptTracker, AuthDependencies, AuthService};
use crate::application::ledger::VoucherLedger;
use crate::application::oauth::OAuthLinker;
use crate::application::profile::ProfileService;
use crate::application::stores::{
    AttemptStore, ProfileStore, RefreshTokenStore, ResetTokenStore, VoucherPageStore,
};
use crate::infrastructure::persistence::{MemoryStore, MemoryUnitOfWorkFactory};
use crate::infrastructure::{Argon2PasswordHasher, LoggingNotifier};

/// 应用状态
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub ledger: Arc<VoucherLedger>,
    pub profiles: Arc<ProfileService>,
    pub codec: Arc<TokenCodec>,
    pub store: MemoryStore,
}

/// 可替换的外部能力
pub struct Collaborators {
    pub store: MemoryStore,
    pub clock: Arc<dyn Clock>,
    pub hasher: Arc<dyn PasswordHasher>,
    pub notifier: Arc<dyn Notifier>,
}

impl Collaborators {
    /// 生产组合：系统时钟、argon2、已配置时走 SMTP
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let notifier: Arc<dyn Notifier> = match &config.email {
            Some(email) => {
                info!(smtp_host = %email.smtp_host, "Using SMTP notifier");
                Arc::new(SmtpNotifier::new(email.clone())?)
            }
            None => Arc::new(LoggingNotifier),
        };

        Ok(Self {
            store: MemoryStore::new(),
            clock: Arc::new(SystemClock),
            hasher: Arc::new(Argon2PasswordHasher::new()),
            notifier,
        })
    }
}

fn session_store<V>(config: &AppConfig, cache_type: CacheType) -> Arc<dyn SessionStore<V>>
where
    V: Clone + Send + Sync + 'static,
{
    Arc::new(MokaSessionStore::<V>::new(
        cache_type.name(),
        cache_type.policy(config),
    ))
}

/// 使用生产组合构建
pub fn build(config: &AppConfig) -> AppResult<AppState> {
    build_with(config, Collaborators::from_config(config)?)
}

/// 使用给定的外部能力构建
pub fn build_with(config: &AppConfig, collaborators: Collaborators) -> AppResult<AppState> {
    let Collaborators {
        store,
        clock,
        hasher,
        notifier,
    } = collaborators;

    let uow_factory: Arc<dyn UnitOfWorkFactory> =
        Arc::new(MemoryUnitOfWorkFactory::new(store.clone()));
    let codec = Arc::new(TokenCodec::new(
        TokenCodecConfig::from(&config.jwt),
        clock.clone(),
    ));

    let refresh_tokens: RefreshTokenStore = session_store(config, CacheType::RefreshTokens);
    let reset_tokens: ResetTokenStore = session_store(config, CacheType::ResetTokens);
    let failed_attempts: AttemptStore = session_store(config, CacheType::FailedAttempts);
    let users: ProfileStore = session_store(config, CacheType::Users);
    let voucher_pages: VoucherPageStore = session_store(config, CacheType::VoucherPages);

    let profiles = ProfileService::new(uow_factory.clone(), users, refresh_tokens.clone());
    let linker = OAuthLinker::new(uow_factory.clone(), hasher.clone());
    let ledger = VoucherLedger::new(uow_factory.clone(), voucher_pages, profiles.clone());

    let auth = AuthService::new(AuthDependencies {
        uow_factory,
        codec: codec.clone(),
        hasher,
        notifier,
        clock,
        refresh_tokens,
        reset_tokens,
        attempts: AttemptTracker::new(failed_attempts, config.login_attempts),
        profiles: profiles.clone(),
        linker,
        reset_config: config.password_reset.clone(),
    });

    info!(app_name = %config.app_name, "Application state built");

    Ok(AppState {
        auth: Arc::new(auth),
        ledger: Arc::new(ledger),
        profiles: Arc::new(profiles),
        codec,
        store,
    })
}
