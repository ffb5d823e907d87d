use relay_server::ServerConfig;
use relay_telemetry::TelemetryConfig;

#[tokio::main]
async fn main() {
    if let Err(e) = relay_telemetry::init_telemetry(&TelemetryConfig::default()) {
        eprintln!("relay: {e}");
    }

    tracing::info!("Starting relay server");

    let config = ServerConfig::default();
    let _handle = match relay_server::start(config).await {
        Ok(handle) => handle,
        Err(e) => {
            tracing::error!(error = %e, "failed to bind listener");
            std::process::exit(1);
        }
    };

    // No graceful drain: open connections are dropped with the process.
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl+c");
        std::future::pending::<()>().await;
    }

    tracing::info!("Shutting down");
}
