use async_trait::async_trait;

use crate::bootstrap::app_context::AppServices;
use crate::bootstrap::config::Config;

/// Establishes the single storage connection of the process and hands back
/// the repositories built on top of it.
#[async_trait]
pub trait DatabaseConnector: Send + Sync {
    async fn connect(&self, cfg: &Config) -> anyhow::Result<AppServices>;
}
