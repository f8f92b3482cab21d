use anyhow::{Context, Result};
use clap::Parser;
use std::{env, net::SocketAddr};
use symptom_ingest::{
    api::{self, AppState},
    config::{AppConfig, Args},
    store::Database,
    Loader,
};
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(log_level.parse().unwrap_or(Level::INFO.into())),
        )
        .init();

    std::panic::set_hook(Box::new(|info| {
        eprintln!("panic: {:?}", info);
    }));

    // ─── 2) configuration ────────────────────────────────────────────
    let config = AppConfig::load(Args::parse())?;
    info!(
        database = %config.database_url,
        vocabulary = %config.loader.vocabulary,
        diagnostic = ?config.loader.diagnostic,
        ragged_rows = ?config.loader.ragged_rows,
        commit_mode = ?config.loader.commit_mode,
        "starting business symptom service"
    );

    // ─── 3) open the store ───────────────────────────────────────────
    let db = Database::open(&config.database_url)
        .with_context(|| format!("opening database {}", config.database_url))?;
    let state = AppState::new(db, Loader::new(config.loader), config.max_upload_bytes);

    // ─── 4) serve ────────────────────────────────────────────────────
    let addr = SocketAddr::new(config.host, config.port);
    info!("Server starting on {}", addr);
    info!("Health check: http://{}/status", addr);
    info!("Upload endpoint: POST http://{}/upload_business_csv/", addr);

    warp::serve(api::routes(state)).run(addr).await;

    Ok(())
}
