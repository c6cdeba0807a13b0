use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Discount {
    pub id: Uuid,
    pub code: String,
    pub percent_off: i32,
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Discount {
    pub fn is_active_at(&self, now: chrono::DateTime<chrono::Utc>) -> bool {
        self.expires_at.map(|at| at > now).unwrap_or(true)
    }
}
