//! Token 编解码
//!
//! 访问令牌和刷新令牌由同一编码器生成，只在有效期和 `token_type` 上不同。
//! 签名校验由 jsonwebtoken 完成；过期判断走注入的 `Clock`，
//! 这样过期令牌依然可以被解析出 claims。

use chrono::Duration;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;
use voyage_common::{Clock, PrincipalId};
use voyage_config::JwtConfig;
use voyage_domain_core::{Principal, PrincipalProfile, Role};
use voyage_errors::{AppError, AppResult};

/// 令牌种类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 校验失败种类
///
/// `Expired` 表示“请重新登录”，`Malformed` 表示“拒绝该请求”。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token is expired")]
    Expired,

    #[error("malformed token: {0}")]
    Malformed(String),
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Expired => AppError::ExpiredToken,
            TokenError::Malformed(_) => AppError::InvalidToken,
        }
    }
}

/// JWT Claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (username)
    pub sub: String,
    /// Principal ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Role
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Issued at
    pub iat: i64,
    /// Expiration time
    pub exp: i64,
    /// JWT ID
    pub jti: String,
    /// Issuer
    #[serde(default)]
    pub iss: String,
    /// Token type (access or refresh)
    #[serde(default)]
    pub token_type: String,
}

impl Claims {
    pub fn principal_id(&self) -> Option<PrincipalId> {
        self.id.as_deref().and_then(|id| PrincipalId::parse(id).ok())
    }

    pub fn role(&self) -> Option<Role> {
        self.role.as_deref().and_then(|r| r.parse().ok())
    }

    pub fn is_kind(&self, kind: TokenKind) -> bool {
        self.token_type == kind.as_str()
    }
}

/// 令牌签发对象
#[derive(Debug, Clone, Copy)]
pub struct TokenSubject<'a> {
    pub id: PrincipalId,
    pub username: &'a str,
    pub role: Role,
}

impl<'a> From<&'a Principal> for TokenSubject<'a> {
    fn from(principal: &'a Principal) -> Self {
        Self {
            id: principal.id,
            username: &principal.username,
            role: principal.role,
        }
    }
}

impl<'a> From<&'a PrincipalProfile> for TokenSubject<'a> {
    fn from(profile: &'a PrincipalProfile) -> Self {
        Self {
            id: profile.id,
            username: &profile.username,
            role: profile.role,
        }
    }
}

/// Codec 配置
///
/// 进程级配置，启动时构造一次；不同密钥可以构造多个 codec。
#[derive(Debug, Clone)]
pub struct TokenCodecConfig {
    pub secret: Secret<String>,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    pub issuer: String,
}

impl From<&JwtConfig> for TokenCodecConfig {
    fn from(config: &JwtConfig) -> Self {
        Self {
            secret: config.secret.clone(),
            access_ttl: Duration::seconds(config.access_ttl_secs as i64),
            refresh_ttl: Duration::seconds(config.refresh_ttl_secs as i64),
            issuer: config.issuer.clone(),
        }
    }
}

/// 一次登录产生的令牌对
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Token 编解码器
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
    issuer: String,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    pub fn new(config: TokenCodecConfig, clock: Arc<dyn Clock>) -> Self {
        let secret = config.secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_ttl: config.access_ttl,
            refresh_ttl: config.refresh_ttl,
            issuer: config.issuer,
            clock,
        }
    }

    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    /// 按种类默认有效期签发
    pub fn issue(&self, subject: TokenSubject<'_>, kind: TokenKind) -> AppResult<String> {
        self.issue_with_ttl(subject, kind, self.ttl(kind))
    }

    /// 签发：expiry = now + ttl
    pub fn issue_with_ttl(
        &self,
        subject: TokenSubject<'_>,
        kind: TokenKind,
        ttl: Duration,
    ) -> AppResult<String> {
        let now = self.clock.now();
        let claims = Claims {
            sub: subject.username.to_string(),
            id: Some(subject.id.to_string()),
            role: Some(subject.role.as_str().to_string()),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
            jti: Uuid::now_v7().to_string(),
            iss: self.issuer.clone(),
            token_type: kind.as_str().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to generate {} token: {}", kind, e)))
    }

    /// 签发访问令牌 + 刷新令牌
    pub fn issue_pair(&self, subject: TokenSubject<'_>) -> AppResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.issue(subject, TokenKind::Access)?,
            refresh_token: self.issue(subject, TokenKind::Refresh)?,
        })
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        // 过期由 Clock 判断
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation
    }

    fn decode_as<T: DeserializeOwned>(&self, token: &str) -> Result<T, TokenError> {
        decode::<T>(token, &self.decoding_key, &self.validation())
            .map(|data| data.claims)
            .map_err(|e| TokenError::Malformed(e.to_string()))
    }

    /// 只校验签名与结构，不检查过期
    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let claims: Claims = self.decode_as(token)?;
        if claims.jti.is_empty() {
            return Err(TokenError::Malformed("token id (jti) missing".to_string()));
        }
        Ok(claims)
    }

    /// 签名校验后再检查过期
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.decode(token)?;
        if self.is_expired(&claims) {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    /// 校验并确认令牌种类
    pub fn verify_kind(&self, token: &str, kind: TokenKind) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if !claims.is_kind(kind) {
            return Err(TokenError::Malformed(format!("not an {} token", kind)));
        }
        Ok(claims)
    }

    pub fn is_expired(&self, claims: &Claims) -> bool {
        claims.exp <= self.clock.now().timestamp()
    }

    /// 结构合法且未过期
    pub fn is_valid(&self, token: &str) -> bool {
        self.verify(token).is_ok()
    }

    /// 读取单个 claim；结构合法但缺少该字段时返回 None
    pub fn extract(&self, token: &str, field: &str) -> Result<Option<String>, TokenError> {
        let claims: serde_json::Map<String, serde_json::Value> = self.decode_as(token)?;
        Ok(match claims.get(field) {
            Some(serde_json::Value::String(value)) => Some(value.clone()),
            Some(serde_json::Value::Number(value)) => Some(value.to_string()),
            Some(serde_json::Value::Bool(value)) => Some(value.to_string()),
            _ => None,
        })
    }

    /// subject（用户名）
    pub fn extract_username(&self, token: &str) -> Result<Option<String>, TokenError> {
        self.extract(token, "sub")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voyage_common::ManualClock;

    const SECRET: &str = "test-secret-test-secret-test-secret";

    fn codec_with(secret: &str, clock: Arc<ManualClock>) -> TokenCodec {
        TokenCodec::new(
            TokenCodecConfig {
                secret: Secret::new(secret.to_string()),
                access_ttl: Duration::minutes(15),
                refresh_ttl: Duration::days(7),
                issuer: "voyage-test".to_string(),
            },
            clock,
        )
    }

    fn principal() -> Principal {
        Principal::new_local("alice", "alice@example.com", "hash")
    }

    #[test]
    fn test_issue_and_verify() {
        let clock = Arc::new(ManualClock::starting_now());
        let codec = codec_with(SECRET, clock.clone());
        let principal = principal();

        let token = codec.issue((&principal).into(), TokenKind::Access).unwrap();
        let claims = codec.verify(&token).unwrap();

        assert_eq!(claims.sub, "alice");
        assert_eq!(claims.principal_id(), Some(principal.id));
        assert_eq!(claims.role(), Some(Role::User));
        assert_eq!(claims.exp - claims.iat, Duration::minutes(15).num_seconds());
        assert!(claims.is_kind(TokenKind::Access));
    }

    #[test]
    fn test_expired_is_distinct_from_malformed() {
        let clock = Arc::new(ManualClock::starting_now());
        let codec = codec_with(SECRET, clock.clone());
        let principal = principal();

        let token = codec.issue((&principal).into(), TokenKind::Access).unwrap();
        clock.advance(Duration::minutes(16));

        assert_eq!(codec.verify(&token), Err(TokenError::Expired));
        assert!(matches!(
            codec.verify("definitely.not.a-jwt"),
            Err(TokenError::Malformed(_))
        ));
        // 过期令牌仍然可以解析出 claims
        assert_eq!(codec.extract_username(&token).unwrap().as_deref(), Some("alice"));
    }

    #[test]
    fn test_foreign_secret_is_malformed() {
        let clock = Arc::new(ManualClock::starting_now());
        let ours = codec_with(SECRET, clock.clone());
        let theirs = codec_with("another-secret-another-secret-xx", clock);
        let principal = principal();

        let token = theirs.issue((&principal).into(), TokenKind::Refresh).unwrap();
        assert!(matches!(ours.verify(&token), Err(TokenError::Malformed(_))));
        assert!(!ours.is_valid(&token));
    }

    #[test]
    fn test_extract_absent_field_is_none() {
        let clock = Arc::new(ManualClock::starting_now());
        let codec = codec_with(SECRET, clock);
        let principal = principal();

        let token = codec.issue((&principal).into(), TokenKind::Refresh).unwrap();
        assert_eq!(codec.extract(&token, "tenant").unwrap(), None);
        assert_eq!(
            codec.extract(&token, "id").unwrap(),
            Some(principal.id.to_string())
        );
        let iat = codec.decode(&token).unwrap().iat;
        assert_eq!(codec.extract(&token, "iat").unwrap(), Some(iat.to_string()));
    }

    #[test]
    fn test_verify_kind_rejects_wrong_kind() {
        let clock = Arc::new(ManualClock::starting_now());
        let codec = codec_with(SECRET, clock);
        let principal = principal();

        let access = codec.issue((&principal).into(), TokenKind::Access).unwrap();
        assert!(codec.verify_kind(&access, TokenKind::Access).is_ok());
        assert!(matches!(
            codec.verify_kind(&access, TokenKind::Refresh),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn test_pair_tokens_are_distinct() {
        let clock = Arc::new(ManualClock::starting_now());
        let codec = codec_with(SECRET, clock);
        let principal = principal();

        let first = codec.issue_pair((&principal).into()).unwrap();
        let second = codec.issue_pair((&principal).into()).unwrap();
        assert_ne!(first.access_token, first.refresh_token);
        assert_ne!(first.refresh_token, second.refresh_token);
    }

    #[test]
    fn test_token_error_maps_to_app_error() {
        assert_eq!(AppError::from(TokenError::Expired), AppError::ExpiredToken);
        assert_eq!(
            AppError::from(TokenError::Malformed("x".to_string())),
            AppError::InvalidToken
        );
    }
}
