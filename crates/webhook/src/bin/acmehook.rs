//! acmehook webhook server binary

use acmehook_core::{KubeSecretStore, SecretStore};
use acmehook_webhook::{AppState, WebhookConfig, build_solvers, logging::init_logging, router};
use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// DNS-01 challenge solver webhook for cert-manager
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short = 'c', long = "config")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Listen address
    #[arg(long)]
    bind: Option<SocketAddr>,
}

impl Cli {
    fn apply(&self, config: &mut WebhookConfig) {
        if let Some(level) = &self.log_level {
            config.server.log_level.clone_from(level);
        }
        if self.json_logs {
            config.server.json_logs = true;
        }
        if let Some(bind) = self.bind {
            config.server.bind_addr = bind;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config =
        WebhookConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply(&mut config);
    config.validate().context("Invalid configuration")?;

    init_logging(&config.server.log_level, config.server.json_logs)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        group = %config.group_name,
        "Starting acmehook webhook"
    );

    let kube_config = kube::Config::infer()
        .await
        .context("Failed to load Kubernetes configuration")?;
    let store: Arc<dyn SecretStore> = Arc::new(KubeSecretStore::from_config(kube_config)?);

    let shutdown = CancellationToken::new();
    let state = AppState::new(&config.group_name, build_solvers(&config.providers)?);
    for solver in state.solvers() {
        solver.initialize(store.clone(), shutdown.clone()).await?;
    }

    let listener = TcpListener::bind(config.server.bind_addr).await?;
    info!("Server listening on http://{}", config.server.bind_addr);

    tokio::spawn(watch_signals(shutdown.clone()));

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    info!("Shut down");
    Ok(())
}

/// Cancel `shutdown` on Ctrl-C or SIGTERM
async fn watch_signals(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    info!("Shutting down...");
    shutdown.cancel();
}
