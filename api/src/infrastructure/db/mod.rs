use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::application::ports::database_connector::DatabaseConnector;
use crate::bootstrap::app_context::AppServices;
use crate::bootstrap::config::Config;
use crate::infrastructure::db::repositories::catalog_repository_sqlx::SqlxCatalogRepository;
use crate::infrastructure::db::repositories::order_repository_sqlx::SqlxOrderRepository;
use crate::infrastructure::db::repositories::user_repository_sqlx::SqlxUserRepository;

pub type PgPool = Pool<Postgres>;

pub async fn connect_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

pub async fn migrate(pool: &PgPool) -> anyhow::Result<()> {
    // Uses compile-time embedded migrations under ./migrations
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

/// Connects the Postgres pool, runs migrations and wires the sqlx
/// repositories.
pub struct PgConnector;

#[async_trait]
impl DatabaseConnector for PgConnector {
    async fn connect(&self, cfg: &Config) -> anyhow::Result<AppServices> {
        let pool = connect_pool(&cfg.database_url, cfg.database_max_connections).await?;
        migrate(&pool).await?;
        tracing::info!(max_connections = cfg.database_max_connections, "database_connected");
        Ok(AppServices::new(
            Arc::new(SqlxCatalogRepository::new(pool.clone())),
            Arc::new(SqlxUserRepository::new(pool.clone())),
            Arc::new(SqlxOrderRepository::new(pool)),
        ))
    }
}

pub mod repositories;
