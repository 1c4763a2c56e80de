//! Voucher Booking Service - 服务入口

use tracing::info;
use voyage_bootstrap::{RuntimeConfig, init_runtime, shutdown_signal};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let runtime = init_runtime(&RuntimeConfig::default())?;

    info!("Initializing Voucher Booking Service...");
    let _state = voucher_booking::build(&runtime.config)?;
    info!("Voucher Booking Service ready");

    shutdown_signal().await;
    info!("Voucher Booking Service stopped");
    Ok(())
}
