use async_trait::async_trait;

use crate::domain::sessions::session::SessionRecord;

/// Backing store for session records. Implementations must tolerate
/// concurrent access from every in-flight request.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the record only while it has not expired.
    async fn load(&self, id: &str) -> anyhow::Result<Option<SessionRecord>>;
    async fn save(&self, record: &SessionRecord) -> anyhow::Result<()>;
    async fn destroy(&self, id: &str) -> anyhow::Result<()>;
    /// Drops expired records, returning how many were removed.
    async fn prune_expired(&self) -> anyhow::Result<usize>;
}
