use anyhow::Context;
use tokio::net::TcpListener;

use carpentry_workshop_server::{
    app::{build_router, AppState},
    config::Config,
    db, logging,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    logging::init(config.log_format);

    let pool = db::init_db_pool(&config.database_url, config.max_pool_size)
        .await
        .context("failed to initialize database")?;

    let state = AppState::from_config(pool, &config);
    let app = build_router(state);

    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!("Server listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
