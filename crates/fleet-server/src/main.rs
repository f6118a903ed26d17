mod config;

use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use fleet_api::{run_http_server, HttpServerConfig};
use fleet_domain::DeviceService;
use fleet_postgres::{ensure_schema, PostgresClient, PostgresDeviceRepository};

use config::ServiceConfig;

#[tokio::main]
async fn main() {
    let config = match ServiceConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!("Starting fleet-server");

    let service = match initialize_service(&config).await {
        Ok(service) => service,
        Err(e) => {
            error!("Failed to initialize service: {:#}", e);
            std::process::exit(1);
        }
    };

    let shutdown_token = CancellationToken::new();
    spawn_signal_handler(shutdown_token.clone());

    let http_config = HttpServerConfig {
        host: config.http_host.clone(),
        port: config.http_port,
    };

    if let Err(e) = run_http_server(http_config, service, shutdown_token).await {
        error!("HTTP server error: {:#}", e);
        std::process::exit(1);
    }

    info!("fleet-server stopped gracefully");
}

async fn initialize_service(config: &ServiceConfig) -> Result<Arc<DeviceService>> {
    info!("Initializing PostgreSQL...");
    let client = PostgresClient::new(
        &config.postgres_host,
        config.postgres_port,
        &config.postgres_database,
        &config.postgres_username,
        &config.postgres_password,
        config.postgres_pool_size,
    )?;
    client.ping().await?;
    ensure_schema(&client).await?;

    let repository = Arc::new(PostgresDeviceRepository::new(client));
    Ok(Arc::new(DeviceService::new(repository)))
}

fn spawn_signal_handler(token: CancellationToken) {
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal");
                ctrl_c_token.cancel();
            }
            Err(err) => {
                error!("Error setting up signal handler: {}", err);
            }
        }
    });

    #[cfg(unix)]
    {
        let token = token.clone();
        tokio::spawn(async move {
            use tokio::signal::unix::{signal, SignalKind};
            let mut sigterm =
                signal(SignalKind::terminate()).expect("Failed to set up SIGTERM handler");
            sigterm.recv().await;
            info!("Received SIGTERM signal");
            token.cancel();
        });
    }
}
