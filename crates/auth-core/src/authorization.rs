//! 角色检查
//!
//! 由（不在本库内的）HTTP 层在调用核心操作前执行。

use voyage_common::PrincipalId;
use voyage_domain_core::Role;

/// 角色是否满足要求集合；空集合表示任意已认证用户
pub fn authorize(role: Role, required: &[Role]) -> bool {
    required.is_empty() || required.contains(&role)
}

/// 是否操作本人资源
pub fn is_self(subject: PrincipalId, target: PrincipalId) -> bool {
    subject == target
}

/// 本人或具备要求角色之一
pub fn is_self_or(subject: PrincipalId, role: Role, target: PrincipalId, required: &[Role]) -> bool {
    is_self(subject, target) || (!required.is_empty() && required.contains(&role))
}
