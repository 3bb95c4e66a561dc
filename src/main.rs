// src/main.rs
use anyhow::Result;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};

use vitals_aggregator::{
    config,
    health::Aggregator,
    metrics::MetricsRegistry,
    server::{MetricsHandler, RequestHandler, ServerBuilder},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vitals_aggregator=debug".parse()?)
                .add_directive("hyper=info".parse()?),
        )
        .init();

    // Load configuration; without a file the built-in profiles are used
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    match &config_path {
        Some(path) => info!("Loading configuration from: {}", path.display()),
        None => info!("No configuration file given, using built-in profiles"),
    }
    let config = config::resolve_config(config_path.as_deref()).await?;
    let profile = config.active_profile()?.clone();

    // Build probes; missing storage credentials abort start-up here
    let mut aggregator = Aggregator::from_config(&config)?;

    if config.metrics.enabled {
        let registry = Arc::new(MetricsRegistry::new()?);
        aggregator = aggregator.with_metrics(registry.collector());

        let metrics_addr: SocketAddr = ([0, 0, 0, 0], config.metrics.port).into();
        start_metrics_server(metrics_addr, registry, config.metrics.path.clone());
    }

    let handler = RequestHandler::new(Arc::new(aggregator), profile.route.as_str());

    info!(
        "Serving profile `{}` on {}{}",
        config.profile, config.listen, profile.route
    );

    ServerBuilder::new(config.listen)
        .with_handler(handler)
        .serve(shutdown_signal())
        .await?;

    info!("Shut down cleanly");
    Ok(())
}

fn start_metrics_server(addr: SocketAddr, registry: Arc<MetricsRegistry>, path: String) {
    info!("Metrics server listening on http://{}{}", addr, path);

    tokio::spawn(async move {
        let result = ServerBuilder::new(addr)
            .with_handler(MetricsHandler::new(registry, path.as_str()))
            .serve(std::future::pending::<()>())
            .await;
        if let Err(e) = result {
            error!("Metrics server error: {}", e);
        }
    });
}

// Graceful shutdown handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
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
