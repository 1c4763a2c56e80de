//! 密码哈希能力

use voyage_errors::AppResult;

/// 密码哈希
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, raw: &str) -> AppResult<String>;

    /// 摘要格式非法时返回 false
    fn verify(&self, raw: &str, digest: &str) -> bool;
}
