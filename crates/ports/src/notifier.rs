//! 通知能力

use async_trait::async_trait;

/// 文本通知（邮件等）
///
/// 发送即忘：失败由实现自行记录，不回传给调用方。
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_text(&self, to: &str, subject: &str, body: &str);
}
