use crate::config::Config;
use crate::services::StoreError;
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use tokio_postgres::NoTls;

const SCHEMA: &str = include_str!("../migrations/001_init.sql");

pub fn init_pool(cfg: &Config) -> Result<Pool, crate::error::AppError> {
    let pg_config: tokio_postgres::Config = cfg
        .database_url
        .parse()
        .map_err(|e| crate::error::AppError::Config(format!("DATABASE_URL: {e}")))?;

    let manager = Manager::from_config(
        pg_config,
        NoTls,
        ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        },
    );

    Pool::builder(manager)
        .max_size(cfg.db_max_connections)
        .build()
        .map_err(|e| crate::error::AppError::StartServer(format!("db pool: {e}")))
}

/// Apply the schema. Every statement is idempotent.
pub async fn run_migrations(pool: &Pool) -> Result<(), StoreError> {
    let client = pool.get().await?;
    client.batch_execute(SCHEMA).await?;
    tracing::info!("database schema up to date");
    Ok(())
}
