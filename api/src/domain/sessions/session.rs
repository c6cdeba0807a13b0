use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value};

/// Server-side state for one client, addressed by the id carried in the
/// session cookie.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionRecord {
    pub id: String,
    pub data: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    pub fn new(id: impl Into<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            data: Map::new(),
            created_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn touch(&mut self, ttl: Duration) {
        self.expires_at = Utc::now() + ttl;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touch_extends_expiry() {
        let mut record = SessionRecord::new("abc", Duration::seconds(1));
        let before = record.expires_at;
        record.touch(Duration::hours(1));
        assert!(record.expires_at > before);
        assert!(!record.is_expired_at(Utc::now()));
    }

    #[test]
    fn zero_ttl_is_expired() {
        let record = SessionRecord::new("abc", Duration::zero());
        assert!(record.is_expired_at(Utc::now()));
    }
}
