use crate::{AppConfig, EmailConfig};
use figment::Jail;
use secrecy::{ExposeSecret, Secret};

const SECRET: &str = "0123456789abcdef0123456789abcdef";

#[test]
fn test_secret_redaction() {
    let secret = Secret::new("my_secret_password".to_string());
    let debug_output = format!("{:?}", secret);
    assert!(debug_output.contains("Secret([REDACTED"));
    assert!(!debug_output.contains("my_secret_password"));
}

#[test]
fn test_email_config_redaction() {
    let config = EmailConfig {
        smtp_host: "smtp.example.com".to_string(),
        smtp_port: 587,
        username: "mailer".to_string(),
        password: Secret::new("hunter2hunter2".to_string()),
        from_email: "noreply@example.com".to_string(),
        from_name: "Voyage".to_string(),
        use_tls: true,
        timeout_secs: 30,
    };
    let debug_output = format!("{:?}", config);
    assert!(!debug_output.contains("hunter2"));
}

#[test]
fn test_load_defaults_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_dir("config")?;
        jail.create_file(
            "config/default.toml",
            &format!("[jwt]\nsecret = \"{SECRET}\"\n"),
        )?;

        let config = AppConfig::load("config").expect("config should load");
        assert_eq!(config.jwt.secret.expose_secret(), SECRET);
        assert_eq!(config.jwt.access_ttl_secs, 3600);
        assert_eq!(config.jwt.refresh_ttl_secs, 604800);
        assert_eq!(config.password_reset.token_ttl_secs, 900);
        assert_eq!(config.login_attempts.max_failures, 5);
        assert_eq!(config.cache.voucher_pages.max_capacity, 500);
        assert!(config.email.is_none());
        assert!(config.is_development());
        Ok(())
    });
}

#[test]
fn test_env_overrides_file() {
    Jail::expect_with(|jail| {
        jail.create_dir("config")?;
        jail.create_file(
            "config/default.toml",
            &format!("[jwt]\nsecret = \"{SECRET}\"\naccess_ttl_secs = 60\n"),
        )?;
        jail.create_file("config/production.toml", "[telemetry]\njson = true\n")?;
        jail.set_env("APP_ENV", "production");
        jail.set_env("APP_JWT__ACCESS_TTL_SECS", "120");

        let config = AppConfig::load("config").expect("config should load");
        assert_eq!(config.jwt.access_ttl_secs, 120);
        assert!(config.telemetry.json);
        assert!(config.is_production());
        Ok(())
    });
}

#[test]
fn test_short_secret_rejected() {
    Jail::expect_with(|jail| {
        jail.create_dir("config")?;
        jail.create_file("config/default.toml", "[jwt]\nsecret = \"short\"\n")?;

        assert!(AppConfig::load("config").is_err());
        Ok(())
    });
}
