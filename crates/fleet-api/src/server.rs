use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::info;

use fleet_domain::DeviceService;

use crate::routes::router;

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
}

/// Serve the device API until the cancellation token fires, then drain
/// in-flight requests and return.
pub async fn run_http_server(
    config: HttpServerConfig,
    service: Arc<DeviceService>,
    ctx: CancellationToken,
) -> Result<()> {
    let app = router(service);
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(addr = %addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            ctx.cancelled().await;
            info!("HTTP server shutting down");
        })
        .await?;

    Ok(())
}
