//! 身份提供方资料适配
//!
//! 每个提供方一个适配器，只做字段提取，不做 I/O。

use serde_json::{Map, Value};
use voyage_domain_core::AuthProvider;
use voyage_errors::{AppError, AppResult};

/// 提供方返回的原始属性
pub type OAuthAttributes = Map<String, Value>;

/// 归一化后的外部身份
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalProfile {
    pub external_id: Option<String>,
    pub email: Option<String>,
    /// 本地用户名候选
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// 提供方资料适配器
pub trait ProfileAdapter: Send + Sync {
    fn provider(&self) -> AuthProvider;

    fn extract(&self, attributes: &OAuthAttributes) -> ExternalProfile;
}

/// 读取字符串属性；数字按十进制文本返回，空串视为缺失
fn text(attributes: &OAuthAttributes, key: &str) -> Option<String> {
    match attributes.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// "First Rest of Name" -> (First, Rest of Name)
fn split_name(full_name: Option<String>) -> (Option<String>, Option<String>) {
    let Some(full_name) = full_name else {
        return (None, None);
    };
    let mut parts = full_name.trim().splitn(2, ' ');
    let first = parts.next().map(str::to_string);
    let last = parts
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string);
    (first, last)
}

/// Google（OIDC 标准声明）
pub struct GoogleProfileAdapter;

impl ProfileAdapter for GoogleProfileAdapter {
    fn provider(&self) -> AuthProvider {
        AuthProvider::Google
    }

    fn extract(&self, attributes: &OAuthAttributes) -> ExternalProfile {
        let email = text(attributes, "email");
        let (split_first, split_last) = split_name(text(attributes, "name"));

        ExternalProfile {
            external_id: text(attributes, "sub"),
            username: email.clone(),
            email,
            first_name: text(attributes, "given_name").or(split_first),
            last_name: text(attributes, "family_name").or(split_last),
        }
    }
}

/// GitHub：`id` 为数字，用户名优先取 `login`
pub struct GithubProfileAdapter;

impl ProfileAdapter for GithubProfileAdapter {
    fn provider(&self) -> AuthProvider {
        AuthProvider::Github
    }

    fn extract(&self, attributes: &OAuthAttributes) -> ExternalProfile {
        let email = text(attributes, "email");
        let (first_name, last_name) = split_name(text(attributes, "name"));

        ExternalProfile {
            external_id: text(attributes, "id"),
            username: text(attributes, "login").or_else(|| email.clone()),
            email,
            first_name,
            last_name,
        }
    }
}

/// Facebook：用户名即邮箱
pub struct FacebookProfileAdapter;

impl ProfileAdapter for FacebookProfileAdapter {
    fn provider(&self) -> AuthProvider {
        AuthProvider::Facebook
    }

    fn extract(&self, attributes: &OAuthAttributes) -> ExternalProfile {
        let email = text(attributes, "email");
        let (split_first, split_last) = split_name(text(attributes, "name"));

        ExternalProfile {
            external_id: text(attributes, "id"),
            username: email.clone(),
            email,
            first_name: text(attributes, "first_name").or(split_first),
            last_name: text(attributes, "last_name").or(split_last),
        }
    }
}

/// 按注册名（如 `github`）选择适配器
pub fn adapter_for(provider_name: &str) -> AppResult<Box<dyn ProfileAdapter>> {
    let provider: AuthProvider = provider_name
        .parse()
        .map_err(|e| AppError::validation(format!("{}", e)))?;

    match provider {
        AuthProvider::Google => Ok(Box::new(GoogleProfileAdapter)),
        AuthProvider::Github => Ok(Box::new(GithubProfileAdapter)),
        AuthProvider::Facebook => Ok(Box::new(FacebookProfileAdapter)),
        AuthProvider::Local => Err(AppError::validation(
            "LOCAL is not an OAuth2 identity provider",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(value: Value) -> OAuthAttributes {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test attributes must be an object"),
        }
    }

    #[test]
    fn test_github_prefers_login_and_splits_name() {
        let profile = GithubProfileAdapter.extract(&attrs(json!({
            "id": 583231,
            "login": "octocat",
            "email": "octo@example.com",
            "name": "The Octo Cat"
        })));

        assert_eq!(profile.external_id.as_deref(), Some("583231"));
        assert_eq!(profile.username.as_deref(), Some("octocat"));
        assert_eq!(profile.first_name.as_deref(), Some("The"));
        assert_eq!(profile.last_name.as_deref(), Some("Octo Cat"));
    }

    #[test]
    fn test_github_falls_back_to_email() {
        let profile = GithubProfileAdapter.extract(&attrs(json!({
            "id": 1,
            "login": "",
            "email": "octo@example.com",
            "name": "Mononym"
        })));

        assert_eq!(profile.username.as_deref(), Some("octo@example.com"));
        assert_eq!(profile.first_name.as_deref(), Some("Mononym"));
        assert_eq!(profile.last_name, None);
    }

    #[test]
    fn test_github_without_login_or_email_has_no_username() {
        let profile = GithubProfileAdapter.extract(&attrs(json!({ "id": 1, "email": null })));
        assert_eq!(profile.username, None);
    }

    #[test]
    fn test_facebook_explicit_names_win() {
        let profile = FacebookProfileAdapter.extract(&attrs(json!({
            "id": "10",
            "email": "fb@example.com",
            "name": "Ignored Name",
            "first_name": "Mark",
            "last_name": "Z"
        })));

        assert_eq!(profile.username.as_deref(), Some("fb@example.com"));
        assert_eq!(profile.first_name.as_deref(), Some("Mark"));
        assert_eq!(profile.last_name.as_deref(), Some("Z"));
    }

    #[test]
    fn test_google_uses_oidc_claims() {
        let profile = GoogleProfileAdapter.extract(&attrs(json!({
            "sub": "1122",
            "email": "g@example.com",
            "given_name": "Grace",
            "family_name": "Hopper"
        })));

        assert_eq!(profile.external_id.as_deref(), Some("1122"));
        assert_eq!(profile.username.as_deref(), Some("g@example.com"));
        assert_eq!(profile.first_name.as_deref(), Some("Grace"));
        assert_eq!(profile.last_name.as_deref(), Some("Hopper"));
    }

    #[test]
    fn test_adapter_for_rejects_unknown_and_local() {
        assert_eq!(adapter_for("GitHub").unwrap().provider(), AuthProvider::Github);
        assert!(matches!(adapter_for("myspace"), Err(AppError::Validation(_))));
        assert!(matches!(adapter_for("local"), Err(AppError::Validation(_))));
    }
}
