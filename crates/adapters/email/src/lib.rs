//! Email 适配器
//!
//! 通过 SMTP 实现 `Notifier`：纯文本邮件，异步发送，失败只记录日志

mod client;

pub use client::SmtpNotifier;
pub use voyage_config::EmailConfig;
