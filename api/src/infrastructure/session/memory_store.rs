use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;

use crate::application::ports::session_store::SessionStore;
use crate::domain::sessions::session::SessionRecord;

/// Process-local session store. Records disappear on restart.
#[derive(Default)]
pub struct MemorySessionStore {
    records: DashMap<String, SessionRecord>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &str) -> anyhow::Result<Option<SessionRecord>> {
        let now = Utc::now();
        let found = self
            .records
            .get(id)
            .map(|r| r.value().clone())
            .filter(|r| !r.is_expired_at(now));
        if found.is_none() {
            self.records.remove_if(id, |_, r| r.is_expired_at(now));
        }
        Ok(found)
    }

    async fn save(&self, record: &SessionRecord) -> anyhow::Result<()> {
        self.records.insert(record.id.clone(), record.clone());
        Ok(())
    }

    async fn destroy(&self, id: &str) -> anyhow::Result<()> {
        self.records.remove(id);
        Ok(())
    }

    async fn prune_expired(&self) -> anyhow::Result<usize> {
        let now = Utc::now();
        let before = self.records.len();
        self.records.retain(|_, r| !r.is_expired_at(now));
        Ok(before - self.records.len())
    }
}
