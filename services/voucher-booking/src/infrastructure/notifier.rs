//! 日志通知器
//!
//! 未配置 SMTP 时使用：只记录收件人和主题，不记录正文（正文含重置链接）。

use async_trait::async_trait;
use tracing::info;
use voyage_ports::Notifier;

#[derive(Debug, Clone, Default)]
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn send_text(&self, to: &str, subject: &str, body: &str) {
        info!(to = %to, subject = %subject, body_len = body.len(), "Notification suppressed (no SMTP configured)");
    }
}
