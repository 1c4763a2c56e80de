//! 密码重置令牌

use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use url::Url;
use voyage_config::PasswordResetConfig;
use voyage_domain_core::PrincipalProfile;
use voyage_errors::{AppError, AppResult};

const RESET_TOKEN_BYTES: usize = 32;

/// 重置链接的落地渠道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResetChannel {
    /// REST 客户端
    Api,
    /// 浏览器页面
    Web,
}

impl ResetChannel {
    fn link_base<'a>(&self, config: &'a PasswordResetConfig) -> &'a str {
        match self {
            Self::Api => &config.api_link_base,
            Self::Web => &config.web_link_base,
        }
    }
}

/// 已签发的重置凭据
///
/// 保存的是请求时刻的用户快照，确认时按快照中的用户名改密。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResetTicket {
    pub profile: PrincipalProfile,
    pub expires_at: DateTime<Utc>,
}

impl ResetTicket {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// 随机重置令牌（hex）
pub fn generate_reset_token() -> String {
    let mut bytes = [0u8; RESET_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// 存储键：令牌的 SHA-256 摘要
pub fn reset_store_key(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

/// `{base}?token={token}`
pub fn build_reset_link(
    config: &PasswordResetConfig,
    channel: ResetChannel,
    token: &str,
) -> AppResult<String> {
    let mut url = Url::parse(channel.link_base(config)).map_err(|e| {
        AppError::internal(format!("Invalid password reset link base for {:?}: {}", channel, e))
    })?;
    url.query_pairs_mut().append_pair("token", token);
    Ok(url.into())
}
