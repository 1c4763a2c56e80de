//! SMTP 通知实现

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use std::time::Duration;
use tracing::{debug, info, warn};
use voyage_config::EmailConfig;
use voyage_errors::{AppError, AppResult};
use voyage_ports::Notifier;

/// SMTP 通知器
#[derive(Clone)]
pub struct SmtpNotifier {
    config: EmailConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpNotifier {
    pub fn new(config: EmailConfig) -> AppResult<Self> {
        let transport = Self::build_transport(&config)?;
        Ok(Self { config, transport })
    }

    /// 构建 SMTP 传输
    fn build_transport(config: &EmailConfig) -> AppResult<AsyncSmtpTransport<Tokio1Executor>> {
        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().clone(),
        );

        let builder = if config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host).map_err(
                |e| AppError::external_service(format!("Failed to create SMTP transport: {}", e)),
            )?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
        };

        Ok(builder
            .port(config.smtp_port)
            .credentials(credentials)
            .timeout(Some(Duration::from_secs(config.timeout_secs)))
            .build())
    }

    /// 构建邮件消息
    fn build_message(&self, to: &str, subject: &str, body: &str) -> AppResult<Message> {
        let from = format!("{} <{}>", self.config.from_name, self.config.from_email)
            .parse()
            .map_err(|e| AppError::internal(format!("Invalid from address: {}", e)))?;

        let to = to
            .parse()
            .map_err(|e| AppError::validation(format!("Invalid to address: {}", e)))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AppError::internal(format!("Failed to build message: {}", e)))
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_text(&self, to: &str, subject: &str, body: &str) {
        let message = match self.build_message(to, subject, body) {
            Ok(message) => message,
            Err(e) => {
                warn!(to = %to, error = %e, "Dropping email that could not be built");
                return;
            }
        };

        debug!(to = %to, subject = %subject, "Sending text email");

        let transport = self.transport.clone();
        let to = to.to_string();
        tokio::spawn(async move {
            match transport.send(message).await {
                Ok(_) => info!(to = %to, "Text email sent successfully"),
                Err(e) => warn!(to = %to, error = %e, "Failed to send email"),
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EmailConfig {
        EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            username: "user@example.com".to_string(),
            password: secrecy::Secret::new("password".to_string()),
            from_email: "noreply@example.com".to_string(),
            from_name: "Voyage".to_string(),
            use_tls: true,
            timeout_secs: 30,
        }
    }

    #[test]
    fn test_build_message() {
        let notifier = SmtpNotifier::new(config()).unwrap();
        let result = notifier.build_message("test@example.com", "Reset", "link");
        assert!(result.is_ok());
    }

    #[test]
    fn test_invalid_recipient_is_validation_error() {
        let notifier = SmtpNotifier::new(config()).unwrap();
        let result = notifier.build_message("not an address", "Reset", "link");
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
