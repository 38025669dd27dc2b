pub mod api;
pub mod config;
pub mod core_state;
pub mod diagnosis;
pub mod extraction;
pub mod kb;
pub mod models;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

/// Fatal startup failures.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Core(#[from] core_state::CoreError),
    #[error(transparent)]
    Server(#[from] api::ServerError),
    #[error("Cannot listen for shutdown signal: {0}")]
    Signal(#[source] std::io::Error),
}

/// Initialize tracing, load configuration, serve until Ctrl-C.
pub async fn run() -> Result<(), StartupError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = config::AppConfig::from_env()?;
    tracing::info!(
        bind = %config.bind,
        provider = ?config.llm.provider,
        rules = %config.rules,
        proof_depth = config.proof_depth,
        "Configuration loaded"
    );

    let bind = config.bind;
    let core = Arc::new(core_state::CoreState::new(config)?);
    let server = api::start_api_server(core, bind).await?;

    tokio::signal::ctrl_c().await.map_err(StartupError::Signal)?;
    tracing::info!("Shutting down");
    server.stop().await;
    Ok(())
}
