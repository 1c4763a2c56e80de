//! 服务运行时

use metrics_exporter_prometheus::PrometheusHandle;
use thiserror::Error;
use tracing::{info, warn};
use voyage_config::{AppConfig, ConfigError};
use voyage_telemetry::{TelemetryError, init_from_config, init_metrics, init_tracing_json};

/// 启动失败
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
}

/// 服务运行时配置
pub struct RuntimeConfig {
    pub config_dir: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            config_dir: "config".to_string(),
        }
    }
}

/// 已初始化的运行时
pub struct Runtime {
    pub config: AppConfig,
    pub metrics: PrometheusHandle,
}

/// 加载配置并初始化 tracing 与 metrics
pub fn init_runtime(runtime: &RuntimeConfig) -> Result<Runtime, BootstrapError> {
    let config = AppConfig::load(&runtime.config_dir)?;

    // 生产环境强制 JSON 日志
    if config.is_production() {
        init_tracing_json(&config.telemetry.log_level)?;
    } else {
        init_from_config(&config.telemetry)?;
    }

    let metrics = init_metrics()?;

    info!(
        app_name = %config.app_name,
        app_env = %config.app_env,
        "Runtime initialized"
    );

    Ok(Runtime { config, metrics })
}

/// 等待关闭信号
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
