//! Serve command - runs the HTTP API

use clap::Args;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use crate::api::create_router;
use crate::config::AppConfig;
use crate::infrastructure::logging;

/// Arguments for the serve command
#[derive(Args, Clone, Debug)]
pub struct ServeArgs {
    /// Host to bind (overrides config)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(long)]
    pub port: Option<u16>,

    /// Start with an empty user store
    #[arg(long)]
    pub no_seed: bool,
}

/// Run the API server until Ctrl+C or SIGTERM
pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let (config, load_error) = load_config(&args);
    logging::init_logging(&config.logging);

    if let Some(e) = load_error {
        warn!(error = %e, "Failed to load configuration, using defaults");
    }

    let state = crate::create_app_state(&config)?;
    let app = create_router(state);

    let addr = config.server.socket_addr()?;
    info!("Starting API server on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("API server shutdown complete");

    Ok(())
}

/// Load configuration with CLI overrides; a load failure falls back to defaults
/// and is handed back so it can be logged once logging is up
fn load_config(args: &ServeArgs) -> (AppConfig, Option<config::ConfigError>) {
    let (mut config, load_error) = match AppConfig::load() {
        Ok(config) => (config, None),
        Err(e) => (AppConfig::default(), Some(e)),
    };

    apply_overrides(&mut config, args);
    (config, load_error)
}

fn apply_overrides(config: &mut AppConfig, args: &ServeArgs) {
    if let Some(host) = &args.host {
        config.server.host = host.clone();
    }

    if let Some(port) = args.port {
        config.server.port = port;
    }

    if args.no_seed {
        config.store.seed = false;
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_overrides() {
        let mut config = AppConfig::default();
        let args = ServeArgs {
            host: Some("127.0.0.1".to_string()),
            port: Some(3000),
            no_seed: true,
        };

        apply_overrides(&mut config, &args);

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert!(!config.store.seed);
    }

    #[test]
    fn test_no_overrides_keeps_config() {
        let mut config = AppConfig::default();
        let args = ServeArgs {
            host: None,
            port: None,
            no_seed: false,
        };

        apply_overrides(&mut config, &args);

        assert_eq!(config.server.port, 8080);
        assert!(config.store.seed);
    }

    #[test]
    fn test_load_config_applies_overrides() {
        let args = ServeArgs {
            host: None,
            port: Some(4000),
            no_seed: false,
        };

        let (config, load_error) = load_config(&args);

        assert!(load_error.is_none());
        assert_eq!(config.server.port, 4000);
    }
}
