//! Service wiring: builds the adapters from [`Config`], hands them to the
//! orchestrator and serves the HTTP API until a shutdown signal arrives.

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::signal;
use tracing::{error, info, warn};

use crate::api::{self, AppState};
use crate::application::ports::DeploymentStore;
use crate::application::services::{Collaborators, Orchestrator};
use crate::config::Config;
use crate::infra::{AwsCliProvider, JsonFileStore, MemoryStore, RandomSlugs, TokioCommandRunner};

/// Construct the orchestrator with production adapters.
#[must_use]
pub fn build_orchestrator(config: &Config) -> Orchestrator {
    let provider = Arc::new(provider(config));

    let store: Arc<dyn DeploymentStore> = match &config.state_file {
        Some(path) => {
            info!(path = %path.display(), "persisting deployments to state file");
            Arc::new(JsonFileStore::with_path(path.clone()))
        }
        None => {
            info!("keeping deployments in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let ports = Collaborators {
        provisioner: provider.clone(),
        executor: provider.clone(),
        inspector: provider,
        store,
        slugs: Arc::new(RandomSlugs),
    };
    Orchestrator::new(ports, config.deploy_settings())
}

fn provider(config: &Config) -> AwsCliProvider<TokioCommandRunner> {
    AwsCliProvider::new(
        TokioCommandRunner::new(config.command_timeout()),
        config.aws_cli.clone(),
        config.region.clone(),
    )
}

/// Bind `config.listen_addr` and serve until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the listener cannot be bound or the server fails.
pub async fn serve(config: Config) -> Result<()> {
    match provider(&config).version().await {
        Ok(version) => info!(version = %version, "provider CLI available"),
        Err(e) => warn!(
            program = %config.aws_cli,
            error = %format!("{e:#}"),
            "provider CLI not usable; deployments will fail until it is installed"
        ),
    }

    let state = AppState {
        orchestrator: Arc::new(build_orchestrator(&config)),
    };
    let router = api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(
        listen_addr = %config.listen_addr,
        region = %config.region,
        readiness = ?config.readiness,
        "launchpad listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("launchpad shut down");
    Ok(())
}

/// Wait for SIGINT (Ctrl-C) or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("received shutdown signal");
}
