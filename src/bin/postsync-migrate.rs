//! Apply the database schema and exit

use postsync::config;
use postsync::data::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::AppConfig::load()?;
    postsync::logging::init(&config.logging);
    tracing::info!(database = %config.database.connection_string(), "Running migrations");

    // connect applies pending migrations
    let db = Database::connect(&config.database.path).await?;
    db.close().await;

    tracing::info!("Migrations applied");
    Ok(())
}
