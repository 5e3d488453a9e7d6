use std::sync::Arc;

use paypal_axum::config::{PayPalConfig, ServerConfig};
use paypal_axum::observability::{init_tracing, LogFormat};
use paypal_axum::provider::PayPalClient;
use paypal_axum::server::router;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    init_tracing(LogFormat::from_env());

    let config = PayPalConfig::from_env()?;
    let server = ServerConfig::from_env()?;
    tracing::info!(
        environment = ?config.environment,
        base_url = %config.base_url,
        currency = %config.currency,
        "starting PayPal backend"
    );

    let client = PayPalClient::new(config)?;
    let app = router(Arc::new(client));

    let listener = tokio::net::TcpListener::bind(server.socket_addr()).await?;
    tracing::info!(address = %listener.local_addr()?, "server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(%err, "cannot listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
