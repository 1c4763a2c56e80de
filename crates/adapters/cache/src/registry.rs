//! 命名存储注册表

use std::fmt;
use voyage_config::{AppConfig, StorePolicy};

/// 会话存储用途
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheType {
    /// principal id -> 刷新令牌
    RefreshTokens,
    /// 令牌摘要 -> 重置凭据
    ResetTokens,
    /// `login:fail:{ip}` -> 失败次数
    FailedAttempts,
    /// id / 用户名 -> 用户快照
    Users,
    /// 列表缓存键 -> 分页结果
    VoucherPages,
}

impl CacheType {
    pub const ALL: [CacheType; 5] = [
        Self::RefreshTokens,
        Self::ResetTokens,
        Self::FailedAttempts,
        Self::Users,
        Self::VoucherPages,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::RefreshTokens => "refresh_tokens",
            Self::ResetTokens => "reset_tokens",
            Self::FailedAttempts => "failed_attempts",
            Self::Users => "users",
            Self::VoucherPages => "voucher_pages",
        }
    }

    /// 解析存储策略
    ///
    /// 未显式配置 TTL 的令牌类存储沿用对应的业务时限。
    pub fn policy(&self, config: &AppConfig) -> StorePolicy {
        let cache = &config.cache;
        match self {
            Self::RefreshTokens => StorePolicy {
                ttl_secs: cache
                    .refresh_tokens
                    .ttl_secs
                    .or(Some(config.jwt.refresh_ttl_secs)),
                ..cache.refresh_tokens
            },
            Self::ResetTokens => StorePolicy {
                ttl_secs: cache
                    .reset_tokens
                    .ttl_secs
                    .or(Some(config.password_reset.token_ttl_secs)),
                ..cache.reset_tokens
            },
            Self::FailedAttempts => StorePolicy {
                ttl_secs: cache
                    .failed_attempts
                    .ttl_secs
                    .or(Some(config.login_attempts.window_secs)),
                ..cache.failed_attempts
            },
            Self::Users => cache.users,
            Self::VoucherPages => cache.voucher_pages,
        }
    }
}

impl fmt::Display for CacheType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<_> = CacheType::ALL.iter().map(CacheType::name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), CacheType::ALL.len());
    }
}
