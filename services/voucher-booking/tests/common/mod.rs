#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Duration;
use parking_lot::Mutex;
use secrecy::Secret;
use std::sync::Arc;
use voucher_booking::application::auth::{AuthSession, RegisterRequest};
use voucher_booking::infrastructure::Argon2PasswordHasher;
use voucher_booking::infrastructure::persistence::MemoryStore;
use voucher_booking::{AppState, Collaborators, build_with};
use voyage_common::ManualClock;
use voyage_config::{
    AppConfig, CacheConfig, JwtConfig, LoginAttemptConfig, PasswordResetConfig, TelemetryConfig,
};
use voyage_domain_core::Money;
use voyage_ports::Notifier;

pub const PASSWORD: &str = "Passw0rd!";

/// 记录发出的通知
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(String, String, String)>>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(String, String, String)> {
        self.sent.lock().clone()
    }

    /// 最近一封邮件中的重置令牌
    pub fn last_token(&self) -> Option<String> {
        let sent = self.sent.lock();
        let (_, _, body) = sent.last()?;
        let start = body.find("token=")? + "token=".len();
        Some(
            body[start..]
                .chars()
                .take_while(char::is_ascii_hexdigit)
                .collect(),
        )
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_text(&self, to: &str, subject: &str, body: &str) {
        self.sent
            .lock()
            .push((to.to_string(), subject.to_string(), body.to_string()));
    }
}

pub struct TestApp {
    pub state: AppState,
    pub clock: Arc<ManualClock>,
    pub notifier: Arc<RecordingNotifier>,
    pub store: MemoryStore,
}

pub fn config() -> AppConfig {
    AppConfig {
        app_name: "voucher-booking-test".to_string(),
        app_env: "test".to_string(),
        jwt: JwtConfig {
            secret: Secret::new("integration-test-secret-0123456789abcdef".to_string()),
            access_ttl_secs: 900,
            refresh_ttl_secs: 86_400,
            issuer: "voyage-test".to_string(),
        },
        password_reset: PasswordResetConfig {
            token_ttl_secs: 900,
            api_link_base: "https://api.example.com/auth/reset".to_string(),
            web_link_base: "https://www.example.com/reset".to_string(),
        },
        login_attempts: LoginAttemptConfig {
            max_failures: 5,
            window_secs: 900,
        },
        cache: CacheConfig::default(),
        telemetry: TelemetryConfig::default(),
        email: None,
    }
}

pub fn app() -> TestApp {
    let clock = Arc::new(ManualClock::starting_now());
    let notifier = Arc::new(RecordingNotifier::default());
    let store = MemoryStore::new();

    let state = build_with(
        &config(),
        Collaborators {
            store: store.clone(),
            clock: clock.clone(),
            hasher: Arc::new(Argon2PasswordHasher::new()),
            notifier: notifier.clone(),
        },
    )
    .unwrap();

    TestApp {
        state,
        clock,
        notifier,
        store,
    }
}

pub fn register_request(username: &str) -> RegisterRequest {
    RegisterRequest {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password: PASSWORD.to_string(),
        first_name: None,
        last_name: None,
        phone_number: None,
    }
}

impl TestApp {
    pub async fn register(&self, username: &str) -> AuthSession {
        self.state
            .auth
            .register(register_request(username))
            .await
            .unwrap()
    }

    /// 注册并充值
    pub async fn funded_user(&self, username: &str, balance: u64) -> AuthSession {
        let session = self.register(username).await;
        if balance > 0 {
            self.state
                .profiles
                .top_up(session.principal.id, Money::from_units(balance))
                .await
                .unwrap();
        }
        session
    }

    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }
}
