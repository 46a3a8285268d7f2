//! OS signal handling.

use crate::lifecycle::Shutdown;

/// Wait for Ctrl+C (SIGINT).
pub async fn wait_for_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");
    Ok(())
}

/// Wait for Ctrl+C, then trigger `shutdown`.
pub async fn trigger_on_signal(shutdown: &Shutdown) -> std::io::Result<()> {
    wait_for_signal().await?;
    shutdown.trigger();
    Ok(())
}
