use std::sync::Arc;

use dotenvy::dotenv;
use tracing::info;

use storefront::bootstrap::config::Config;
use storefront::bootstrap::{startup, supervisor};
use storefront::infrastructure::db::PgConnector;
use storefront::infrastructure::session::MemorySessionStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "storefront=debug,tower_http=info".into()),
        )
        .init();
    supervisor::install_panic_hook();

    let cfg = Config::from_env()?;
    info!(?cfg, "Starting storefront backend");

    let server = startup::prepare(cfg, &PgConnector, Arc::new(MemorySessionStore::new())).await?;
    server.run().await
}
