//! id 生成

use uuid::Uuid;

/// 实体 id：UUID v7，按创建时间有序
pub fn new_id() -> Uuid {
    Uuid::now_v7()
}

/// 不可预测的随机值（v4），用于 OAuth 新用户的占位密码
pub fn random_id() -> Uuid {
    Uuid::new_v4()
}
