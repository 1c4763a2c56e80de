//! OAuth2 账户关联

use std::sync::Arc;
use tracing::{info, warn};
use voyage_common::utils::random_id;
use voyage_domain_core::{AuthProvider, Principal};
use voyage_errors::{AppError, AppResult};
use voyage_ports::{PasswordHasher, UnitOfWorkFactory};

use super::providers::{OAuthAttributes, adapter_for};

/// 把外部身份映射到本地账户（存在则更新，不存在则创建）
#[derive(Clone)]
pub struct OAuthLinker {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
    hasher: Arc<dyn PasswordHasher>,
}

impl OAuthLinker {
    pub fn new(uow_factory: Arc<dyn UnitOfWorkFactory>, hasher: Arc<dyn PasswordHasher>) -> Self {
        Self {
            uow_factory,
            hasher,
        }
    }

    pub async fn resolve(
        &self,
        provider_name: &str,
        attributes: &OAuthAttributes,
    ) -> AppResult<Principal> {
        let adapter = adapter_for(provider_name)?;
        let provider = adapter.provider();
        let external = adapter.extract(attributes);

        let Some(username) = external.username else {
            warn!(provider = %provider, "OAuth2 profile has neither email nor login");
            return Err(AppError::missing_identity(format!(
                "{} did not supply an email or login",
                provider
            )));
        };

        let uow = self.uow_factory.begin().await?;
        let existing = match external.email.as_deref() {
            Some(email) => uow.principals().find_by_email(email).await?,
            None => uow.principals().find_by_username(&username).await?,
        };

        let principal = match existing {
            Some(mut principal) => {
                if principal.auth_provider != provider {
                    warn!(
                        user_id = %principal.id,
                        linked = %principal.auth_provider,
                        attempted = %provider,
                        "OAuth2 provider mismatch"
                    );
                    return Err(AppError::provider_mismatch(format!(
                        "account is linked to {}",
                        principal.auth_provider
                    )));
                }

                if let Some(first_name) = external.first_name {
                    principal.first_name = Some(first_name);
                }
                if let Some(last_name) = external.last_name {
                    principal.last_name = Some(last_name);
                }
                uow.principals().save(&principal).await?;
                principal
            }
            None => {
                // 占位密码，永不用于登录
                let placeholder = self.hasher.hash(&random_id().to_string())?;
                let principal = new_linked_principal(
                    provider,
                    username,
                    external.email.unwrap_or_default(),
                    placeholder,
                )
                .with_names(external.first_name, external.last_name);
                uow.principals().save(&principal).await?;
                info!(user_id = %principal.id, provider = %provider, "Registered OAuth2 user");
                principal
            }
        };

        uow.commit().await?;
        Ok(principal)
    }
}

fn new_linked_principal(
    provider: AuthProvider,
    username: String,
    email: String,
    password_hash: String,
) -> Principal {
    let mut principal = Principal::new_local(username, email, password_hash);
    principal.auth_provider = provider;
    principal
}
