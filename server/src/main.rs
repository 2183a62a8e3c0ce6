//! Launchpad server entry point.
//!
//! Reads an optional `.env` file, initialises tracing, loads configuration
//! from `LAUNCHPAD_*` environment variables and serves the HTTP API.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use launchpad_server::app;
use launchpad_server::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. A missing .env file is fine; the environment may be set directly.
    let dotenv = dotenvy::dotenv();

    // 2. Initialise tracing with RUST_LOG env filter.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Ok(path) = dotenv {
        tracing::debug!(path = %path.display(), "loaded .env file");
    }
    tracing::info!("launchpad starting");

    // 3. Load configuration from LAUNCHPAD_* env vars.
    let config = Config::from_env()?;
    tracing::info!(
        listen_addr = %config.listen_addr,
        region = %config.region,
        state_file = ?config.state_file,
        "configuration loaded",
    );

    app::serve(config).await
}
