//! voyage-config - 配置加载库
//!
//! 启动时加载一次，之后只读。

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::Secret;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] figment::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// JWT 配置
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: Secret<String>,
    #[serde(default = "default_access_ttl_secs")]
    pub access_ttl_secs: u64,
    #[serde(default = "default_refresh_ttl_secs")]
    pub refresh_ttl_secs: u64,
    #[serde(default = "default_issuer")]
    pub issuer: String,
}

fn default_access_ttl_secs() -> u64 {
    3600
}

fn default_refresh_ttl_secs() -> u64 {
    604800
}

fn default_issuer() -> String {
    "voyage".to_string()
}

/// 密码重置配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetConfig {
    #[serde(default = "default_reset_ttl_secs")]
    pub token_ttl_secs: u64,
    #[serde(default = "default_api_link_base")]
    pub api_link_base: String,
    #[serde(default = "default_web_link_base")]
    pub web_link_base: String,
}

fn default_reset_ttl_secs() -> u64 {
    900
}

fn default_api_link_base() -> String {
    "http://localhost:8080/api/auth/reset-password/validate".to_string()
}

fn default_web_link_base() -> String {
    "http://localhost:8080/auth/reset-password/validate".to_string()
}

impl Default for PasswordResetConfig {
    fn default() -> Self {
        Self {
            token_ttl_secs: default_reset_ttl_secs(),
            api_link_base: default_api_link_base(),
            web_link_base: default_web_link_base(),
        }
    }
}

/// 登录失败锁定配置
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LoginAttemptConfig {
    #[serde(default = "default_max_failures")]
    pub max_failures: u32,
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

fn default_max_failures() -> u32 {
    5
}

fn default_window_secs() -> u64 {
    900
}

impl Default for LoginAttemptConfig {
    fn default() -> Self {
        Self {
            max_failures: default_max_failures(),
            window_secs: default_window_secs(),
        }
    }
}

/// 单个缓存实例的策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorePolicy {
    /// 写入后存活时间（秒），None 表示沿用所属功能的默认值
    pub ttl_secs: Option<u64>,
    pub max_capacity: u64,
}

/// 各命名缓存实例的策略
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_refresh_tokens_policy")]
    pub refresh_tokens: StorePolicy,
    #[serde(default = "default_reset_tokens_policy")]
    pub reset_tokens: StorePolicy,
    #[serde(default = "default_failed_attempts_policy")]
    pub failed_attempts: StorePolicy,
    #[serde(default = "default_users_policy")]
    pub users: StorePolicy,
    #[serde(default = "default_voucher_pages_policy")]
    pub voucher_pages: StorePolicy,
}

fn default_refresh_tokens_policy() -> StorePolicy {
    StorePolicy {
        ttl_secs: None,
        max_capacity: 10_000,
    }
}

fn default_reset_tokens_policy() -> StorePolicy {
    StorePolicy {
        ttl_secs: None,
        max_capacity: 1_000,
    }
}

fn default_failed_attempts_policy() -> StorePolicy {
    StorePolicy {
        ttl_secs: None,
        max_capacity: 10_000,
    }
}

fn default_users_policy() -> StorePolicy {
    StorePolicy {
        ttl_secs: Some(600),
        max_capacity: 5_000,
    }
}

fn default_voucher_pages_policy() -> StorePolicy {
    StorePolicy {
        ttl_secs: Some(300),
        max_capacity: 500,
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            refresh_tokens: default_refresh_tokens_policy(),
            reset_tokens: default_reset_tokens_policy(),
            failed_attempts: default_failed_attempts_policy(),
            users: default_users_policy(),
            voucher_pages: default_voucher_pages_policy(),
        }
    }
}

/// 遥测配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
        }
    }
}

/// 邮件配置
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: Secret<String>,
    pub from_email: String,
    pub from_name: String,
    #[serde(default)]
    pub use_tls: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_app_name")]
    pub app_name: String,
    #[serde(default = "default_app_env")]
    pub app_env: String,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub password_reset: PasswordResetConfig,
    #[serde(default)]
    pub login_attempts: LoginAttemptConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    pub email: Option<EmailConfig>,
}

fn default_app_name() -> String {
    "voucher-booking".to_string()
}

fn default_app_env() -> String {
    "development".to_string()
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 顺序：`{dir}/default.toml` → `{dir}/{APP_ENV}.toml` → `APP_` 前缀环境变量
    /// （嵌套字段用 `__` 分隔，如 `APP_JWT__SECRET`）。
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| default_app_env());

        let config: Self = Self::figment(config_dir, &env).extract()?;
        config.validate()?;

        Ok(config)
    }

    fn figment(config_dir: &str, env: &str) -> Figment {
        Figment::new()
            .merge(Serialized::default("app_env", env))
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed("APP_").split("__"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        use secrecy::ExposeSecret;

        if self.jwt.secret.expose_secret().len() < 32 {
            return Err(ConfigError::Invalid(
                "jwt.secret must be at least 32 bytes".to_string(),
            ));
        }
        if self.jwt.access_ttl_secs == 0 || self.jwt.refresh_ttl_secs == 0 {
            return Err(ConfigError::Invalid("jwt ttl must be positive".to_string()));
        }
        if self.login_attempts.max_failures == 0 {
            return Err(ConfigError::Invalid(
                "login_attempts.max_failures must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// 是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}

#[cfg(test)]
mod tests;
