//! 基础设施层

pub mod notifier;
pub mod password;
pub mod persistence;

pub use notifier::LoggingNotifier;
pub use password::Argon2PasswordHasher;
