use std::cmp::max;

use sea_orm::{ConnectOptions, Database, DatabaseConnection};

use crate::config;

/// Connects using the `database` section of the application config.
/// Pool sizing scales with the host so concurrent request handlers do
/// not starve each other's transactions.
pub async fn init() -> anyhow::Result<DatabaseConnection> {
    let config = config::get().database();
    let url = format!(
        "postgres://{}:{}@{}:{}/{}",
        config.username(),
        config.password(),
        config.host(),
        config.port(),
        config.database()
    );

    connect(&url, config.schema()).await
}

pub async fn connect(url: &str, schema: &str) -> anyhow::Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(url);
    options
        .min_connections(max(num_cpus::get() as u32 * 4, 10))
        .max_connections(max(num_cpus::get() as u32 * 8, 20))
        .connect_timeout(std::time::Duration::from_secs(8))
        .acquire_timeout(std::time::Duration::from_secs(30))
        .idle_timeout(std::time::Duration::from_secs(300))
        .max_lifetime(std::time::Duration::from_secs(3600))
        .sqlx_logging(true)
        .set_schema_search_path(schema);

    let db = Database::connect(options).await?;
    db.ping().await?;

    tracing::info!("Database connected successfully");

    Ok(db)
}
