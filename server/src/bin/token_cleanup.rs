use chrono::Utc;

use gatehouse_server::{
    config::Config, db::connection::create_pool, repositories::refresh_tokens,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().init();

    let config = Config::load()?;
    let pool = create_pool(&config.database_url).await?;

    let purged = refresh_tokens::purge_stale(&pool, Utc::now()).await?;
    if purged > 0 {
        tracing::info!("Purged {} stale refresh tokens", purged);
    }

    Ok(())
}
