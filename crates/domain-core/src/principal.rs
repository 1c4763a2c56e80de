//! 用户（Principal）实体

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use voyage_common::PrincipalId;

use crate::Money;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

/// 角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Manager,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Manager => "MANAGER",
            Self::Admin => "ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USER" => Ok(Self::User),
            "MANAGER" => Ok(Self::Manager),
            "ADMIN" => Ok(Self::Admin),
            _ => Err(UnknownVariant {
                kind: "role",
                value: s.to_string(),
            }),
        }
    }
}

/// 认证来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuthProvider {
    Local,
    Google,
    Github,
    Facebook,
}

impl AuthProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "LOCAL",
            Self::Google => "GOOGLE",
            Self::Github => "GITHUB",
            Self::Facebook => "FACEBOOK",
        }
    }
}

impl fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthProvider {
    type Err = UnknownVariant;

    /// 大小写不敏感，OAuth 注册名（如 `google`）可直接解析
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOCAL" => Ok(Self::Local),
            "GOOGLE" => Ok(Self::Google),
            "GITHUB" => Ok(Self::Github),
            "FACEBOOK" => Ok(Self::Facebook),
            _ => Err(UnknownVariant {
                kind: "auth provider",
                value: s.to_string(),
            }),
        }
    }
}

/// 用户实体
///
/// 归持久层所有；认证与账本只通过显式操作修改余额和启用状态。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    pub id: PrincipalId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub balance: Money,
    pub active: bool,
    pub role: Role,
    pub auth_provider: AuthProvider,
    pub created_at: DateTime<Utc>,
}

impl Principal {
    /// 新建本地注册用户：角色 USER、来源 LOCAL、启用、余额为 0
    pub fn new_local(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: PrincipalId::new(),
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            first_name: None,
            last_name: None,
            phone_number: None,
            balance: Money::ZERO,
            active: true,
            role: Role::User,
            auth_provider: AuthProvider::Local,
            created_at: Utc::now(),
        }
    }

    pub fn with_names(mut self, first_name: Option<String>, last_name: Option<String>) -> Self {
        self.first_name = first_name;
        self.last_name = last_name;
        self
    }

    pub fn with_balance(mut self, balance: Money) -> Self {
        self.balance = balance;
        self
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// 扣款；余额不足时返回 false 且不修改余额
    pub fn try_debit(&mut self, amount: Money) -> bool {
        match self.balance.checked_sub(amount) {
            Some(balance) => {
                self.balance = balance;
                true
            }
            None => false,
        }
    }

    pub fn credit(&mut self, amount: Money) {
        // Decimal 溢出上限远超任何合法余额
        if let Some(balance) = self.balance.checked_add(amount) {
            self.balance = balance;
        }
    }

    pub fn profile(&self) -> PrincipalProfile {
        PrincipalProfile::from(self)
    }
}

/// 用户快照（DTO）
///
/// 不含密码哈希；缓存和重置令牌中保存的都是它而不是实体引用。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrincipalProfile {
    pub id: PrincipalId,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub balance: Money,
    pub active: bool,
    pub role: Role,
    pub auth_provider: AuthProvider,
}

impl From<&Principal> for PrincipalProfile {
    fn from(principal: &Principal) -> Self {
        Self {
            id: principal.id,
            username: principal.username.clone(),
            email: principal.email.clone(),
            first_name: principal.first_name.clone(),
            last_name: principal.last_name.clone(),
            phone_number: principal.phone_number.clone(),
            balance: principal.balance,
            active: principal.active,
            role: principal.role,
            auth_provider: principal.auth_provider,
        }
    }
}
