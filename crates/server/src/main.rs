use std::sync::Arc;

use anyhow::Context;
use marquee_metadata::TmdbClient;
use marquee_providers::Registry;
use marquee_server::config::{LogFormat, ServerConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("failed to read configuration")?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());
    match config.log_format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
    }

    info!(db_path = %config.db_path, "connecting to database");
    let pool = marquee_db::connect(&config.db_path)
        .await
        .context("failed to connect to database")?;

    let applied = marquee_db::migrate::run(&pool)
        .await
        .context("failed to run migrations")?;
    info!(applied, "migrations complete");

    if config.tmdb_api_key.is_none() {
        warn!("TMDB_API_KEY is not set; metadata routes will answer 500");
    }
    let mut tmdb = TmdbClient::new(config.tmdb_api_key.clone()).with_cache_ttl(config.cache_ttl);
    if let Some(base_url) = &config.tmdb_base_url {
        tmdb = tmdb.with_base_url(base_url.as_str());
    }

    let providers = Registry::builtin().with_disabled(&config.disabled_providers[..]);
    let enabled: Vec<&str> = providers.enabled().map(|p| p.name).collect();
    info!(providers = ?enabled, "provider registry ready");

    let app_state = marquee_server::state::AppState::new(
        pool,
        Arc::new(tmdb),
        providers,
        config.progress_limit,
        config.cache_ttl,
    );

    let app = marquee_server::routes::build_router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind)
        .await
        .context("failed to bind")?;
    info!(addr = %config.bind, "server listening");

    axum::serve(listener, app).await?;
    Ok(())
}
