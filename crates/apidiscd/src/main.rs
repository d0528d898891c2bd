//! apidiscd - Discovery Aggregation Daemon
//!
//! Serves one merged discovery document for its own API group and every
//! configured remote backend.
//!
//! Usage:
//!   apidiscd [OPTIONS] [config.toml]
//!
//! Options:
//!   -p, --port <port>  Override the listen port from the config file
//!
//! Without a config file only the daemon's own group is served.

mod config;
mod local;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use apidisc_aggregator::DiscoveryManager;
use apidisc_api::{create_router, AppState, ResourceManager};
use apidisc_proxy::HttpDiscoveryHandler;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::DaemonConfig;

/// Parsed command-line arguments
struct Args {
    /// Daemon config file (TOML)
    config_path: Option<String>,
    /// Listen port override
    port: Option<u16>,
}

fn parse_args() -> anyhow::Result<Args> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut result = Args {
        config_path: None,
        port: None,
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--port" | "-p" => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| anyhow::anyhow!("Missing argument for --port"))?;
                result.port = Some(
                    value
                        .parse()
                        .map_err(|e| anyhow::anyhow!("Invalid port '{}': {}", value, e))?,
                );
                i += 2;
            }
            "--help" | "-h" => {
                print_help();
                std::process::exit(0);
            }
            arg if !arg.starts_with('-') => {
                // Positional argument = config file
                result.config_path = Some(arg.to_string());
                i += 1;
            }
            _ => {
                tracing::warn!("Unknown argument: {}", args[i]);
                i += 1;
            }
        }
    }

    Ok(result)
}

fn print_help() {
    eprintln!(
        r#"apidiscd - Discovery Aggregation Daemon

Usage: apidiscd [OPTIONS] [config.toml]

Options:
  -p, --port <port>  Override the listen port from the config file
  -h, --help         Print this help message

Examples:
  # Serve only the daemon's own group on port 8080
  apidiscd

  # Aggregate the backends listed in a config file
  apidiscd config.toml

  # Same, on another port
  apidiscd -p 9443 config.toml
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "apidiscd=info,apidisc_aggregator=info,apidisc_api=info,apidisc_proxy=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting apidiscd (Discovery Aggregation Daemon)");

    let args = parse_args()?;

    let config = if let Some(ref path) = args.config_path {
        tracing::info!("Loading config from: {}", path);
        DaemonConfig::load(Path::new(path))?
    } else {
        tracing::info!("No config file provided, serving the local group only");
        DaemonConfig::default()
    };
    let port = args.port.unwrap_or(config.server.port);

    // The merged document is what clients read
    let merged = Arc::new(ResourceManager::new());
    let manager = Arc::new(DiscoveryManager::with_config(
        merged.clone(),
        config.manager.clone(),
    ));

    let local = Arc::new(ResourceManager::new());
    local.add_group_version(local::LOCAL_GROUP, local::version());
    manager.add_api_service(local::api_service(), local);

    tracing::info!(backend_count = config.backends.len(), "Registering remote backends");
    for backend in &config.backends {
        let handler = HttpDiscoveryHandler::with_config(
            &backend.url,
            backend.timeout(),
            backend.connect_timeout(),
        )
        .map_err(|e| anyhow::anyhow!("Failed to create backend '{}': {}", backend.url, e))?;
        let service = backend.api_service();
        tracing::info!(
            name = %service.name,
            url = %backend.url,
            "Creating remote backend"
        );
        manager.add_api_service(service, Arc::new(handler));
    }

    // Local groups are published once this returns
    let cancel = CancellationToken::new();
    let handle = manager.run(cancel.clone()).await;

    let readiness = manager.clone();
    let state = AppState::new(merged).with_readiness(move || readiness.queue_len() == 0);
    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await?;

    cancel.cancel();
    handle.wait().await;
    tracing::info!("apidiscd stopped");

    Ok(())
}

async fn shutdown_signal(cancel: CancellationToken) {
    tokio::select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => tracing::info!("Shutdown signal received"),
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                cancel.cancelled().await;
            }
        },
        _ = cancel.cancelled() => {}
    }
}
