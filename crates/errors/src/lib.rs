//! voyage-errors - 统一错误处理
//!
//! 基于 RFC 7807 Problem Details 规范

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 应用错误类型
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("Bad credentials")]
    BadCredentials,

    #[error("Account is disabled")]
    AccountDisabled,

    #[error("Already in use: {0}")]
    AlreadyInUse(String),

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token is expired")]
    ExpiredToken,

    #[error("Missing identity: {0}")]
    MissingIdentity(String),

    #[error("Wrong provider used: {0}")]
    ProviderMismatch(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Not enough balance")]
    NotEnoughBalance,

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Too many failed attempts")]
    TooManyAttempts,

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("External service error: {0}")]
    ExternalService(String),
}

impl AppError {
    pub fn already_in_use(msg: impl Into<String>) -> Self {
        Self::AlreadyInUse(msg.into())
    }

    pub fn missing_identity(msg: impl Into<String>) -> Self {
        Self::MissingIdentity(msg.into())
    }

    pub fn provider_mismatch(msg: impl Into<String>) -> Self {
        Self::ProviderMismatch(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn invalid_status(msg: impl Into<String>) -> Self {
        Self::InvalidStatus(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    pub fn external_service(msg: impl Into<String>) -> Self {
        Self::ExternalService(msg.into())
    }

    /// 转换为 HTTP 状态码
    pub fn status_code(&self) -> u16 {
        match self {
            Self::BadCredentials => 400,
            Self::AccountDisabled => 423,
            Self::AlreadyInUse(_) => 409,
            Self::InvalidToken => 400,
            Self::ExpiredToken => 401,
            Self::MissingIdentity(_) => 400,
            Self::ProviderMismatch(_) => 400,
            Self::NotFound(_) => 404,
            Self::NotEnoughBalance => 406,
            Self::InvalidStatus(_) => 422,
            Self::Validation(_) => 400,
            Self::Forbidden(_) => 403,
            Self::TooManyAttempts => 429,
            Self::Internal(_) => 500,
            Self::Database(_) => 500,
            Self::ExternalService(_) => 502,
        }
    }

    /// 是否为底层基础设施故障（调用方可自行决定是否重试）
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            Self::Internal(_) | Self::Database(_) | Self::ExternalService(_)
        )
    }

    /// 转换为 Problem Details
    pub fn to_problem_details(&self) -> ProblemDetails {
        ProblemDetails {
            r#type: format!("https://api.voyage.travel/problems/{}", self.problem_slug()),
            title: self.problem_title().to_string(),
            status: self.status_code(),
            detail: self.to_string(),
            instance: None,
        }
    }

    fn problem_slug(&self) -> &'static str {
        match self {
            Self::BadCredentials => "bad-credentials",
            Self::AccountDisabled => "account-disabled",
            Self::AlreadyInUse(_) => "already-in-use",
            Self::InvalidToken => "invalid-token",
            Self::ExpiredToken => "expired-token",
            Self::MissingIdentity(_) => "missing-identity",
            Self::ProviderMismatch(_) => "provider-mismatch",
            Self::NotFound(_) => "not-found",
            Self::NotEnoughBalance => "not-enough-balance",
            Self::InvalidStatus(_) => "invalid-status",
            Self::Validation(_) => "validation",
            Self::Forbidden(_) => "forbidden",
            Self::TooManyAttempts => "too-many-attempts",
            Self::Internal(_) => "internal",
            Self::Database(_) => "database",
            Self::ExternalService(_) => "external-service",
        }
    }

    fn problem_title(&self) -> &'static str {
        match self {
            Self::BadCredentials => "Bad Credentials",
            Self::AccountDisabled => "Account Disabled",
            Self::AlreadyInUse(_) => "Already In Use",
            Self::InvalidToken => "Invalid Token",
            Self::ExpiredToken => "Expired Token",
            Self::MissingIdentity(_) => "Missing Identity",
            Self::ProviderMismatch(_) => "Provider Mismatch",
            Self::NotFound(_) => "Resource Not Found",
            Self::NotEnoughBalance => "Not Enough Balance",
            Self::InvalidStatus(_) => "Invalid Status",
            Self::Validation(_) => "Validation Error",
            Self::Forbidden(_) => "Forbidden",
            Self::TooManyAttempts => "Too Many Attempts",
            Self::Internal(_) => "Internal Server Error",
            Self::Database(_) => "Database Error",
            Self::ExternalService(_) => "External Service Error",
        }
    }
}

/// RFC 7807 Problem Details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProblemDetails {
    pub r#type: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

/// Result 类型别名
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes_follow_taxonomy() {
        assert_eq!(AppError::BadCredentials.status_code(), 400);
        assert_eq!(AppError::AccountDisabled.status_code(), 423);
        assert_eq!(AppError::already_in_use("username").status_code(), 409);
        assert_eq!(AppError::ExpiredToken.status_code(), 401);
        assert_eq!(AppError::NotEnoughBalance.status_code(), 406);
        assert_eq!(AppError::invalid_status("FOO").status_code(), 422);
        assert_eq!(AppError::not_found("voucher").status_code(), 404);
    }

    #[test]
    fn test_expired_and_invalid_are_distinct() {
        assert_ne!(AppError::InvalidToken, AppError::ExpiredToken);
        assert_ne!(
            AppError::InvalidToken.status_code(),
            AppError::ExpiredToken.status_code()
        );
    }

    #[test]
    fn test_problem_details_serialization() {
        let problem = AppError::not_found("Voucher not found").to_problem_details();
        assert_eq!(problem.status, 404);
        assert_eq!(problem.r#type, "https://api.voyage.travel/problems/not-found");

        let json = serde_json::to_value(&problem).unwrap();
        assert_eq!(json["detail"], "Not found: Voucher not found");
        assert!(json.get("instance").is_none());
    }

    #[test]
    fn test_infrastructure_classification() {
        assert!(AppError::database("connection reset").is_infrastructure());
        assert!(!AppError::NotEnoughBalance.is_infrastructure());
    }
}
