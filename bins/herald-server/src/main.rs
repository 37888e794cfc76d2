use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;

use delivery_http::{HttpDelivery, HttpDeliveryConfig};
use herald_api_server::AppState;
use herald_engine::{Engine, HeraldConfig};

#[derive(Parser)]
#[command(name = "herald-server", about = "Herald HTTP message broker")]
struct Cli {
    /// Path to TOML configuration file. Built-in defaults apply when omitted.
    #[arg(long, env = "HERALD_CONFIG")]
    config: Option<String>,

    /// Listen port; overrides `api_port` from the configuration.
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!(config = %path, "loading configuration");
            match HeraldConfig::load(path) {
                Ok(c) => c,
                Err(e) => {
                    tracing::error!(error = %e, "failed to load config");
                    std::process::exit(1);
                }
            }
        }
        None => {
            tracing::info!("no configuration file given, using defaults");
            HeraldConfig::default()
        }
    };
    if let Some(port) = cli.port {
        config.api_port = port;
    }

    let delivery = match HttpDelivery::new(HttpDeliveryConfig {
        timeout: config.delivery.timeout(),
    }) {
        Ok(d) => d,
        Err(e) => {
            tracing::error!(error = %e, "failed to build delivery client");
            std::process::exit(1);
        }
    };

    let shutdown = CancellationToken::new();
    let engine = match Engine::bootstrap(config, Arc::new(delivery), shutdown.clone()).await {
        Ok(e) => e,
        Err(e) => {
            tracing::error!(error = %e, "failed to bootstrap engine");
            std::process::exit(1);
        }
    };

    let port = engine.config().api_port;
    let state = AppState::from_engine(&engine);
    let mut api = tokio::spawn(herald_api_server::run(port, state, shutdown.clone()));
    tracing::info!(port, "herald-server started, press Ctrl+C to stop");

    let mut exit_code = 0;
    tokio::select! {
        result = &mut api => {
            // The listener only returns on its own when it fails.
            match result {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::error!(error = %e, "api server stopped");
                    exit_code = 1;
                }
                Err(e) => {
                    tracing::error!(error = %e, "api server task failed");
                    exit_code = 1;
                }
            }
        }
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                tracing::error!(error = %e, "failed to listen for Ctrl+C");
                exit_code = 1;
            }
            tracing::info!("shutting down...");
            shutdown.cancel();
            match api.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => tracing::error!(error = %e, "api server stopped with error"),
                Err(e) => tracing::error!(error = %e, "api server task failed"),
            }
        }
    }

    engine.shutdown().await;
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}
