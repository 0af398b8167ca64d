use edgelink_runner::{Gateway, RunnerConfig};

#[tokio::main]
async fn main() {
    env_logger::init();

    let config = RunnerConfig::from_env();
    let gateway = Gateway::bootstrap(config);

    // Connect eagerly so clients find a live upstream, but keep serving
    // when the handshake fails; clients get not_connected errors until a
    // later connect succeeds.
    if let Err(e) = gateway.connect_upstream().await {
        log::warn!("Upstream connect failed at startup: {e}");
    }

    match tokio::signal::ctrl_c().await {
        Ok(()) => log::info!("Shutdown signal received"),
        Err(e) => log::error!("Failed to listen for shutdown signal: {e}"),
    }

    gateway.shutdown().await;
}
