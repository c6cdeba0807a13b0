use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::application::ports::order_repository::OrderRepository;
use crate::domain::accounts::order::Order;
use crate::infrastructure::db::PgPool;

pub struct SqlxOrderRepository {
    pub pool: PgPool,
}

impl SqlxOrderRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for SqlxOrderRepository {
    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Order>> {
        let rows = sqlx::query(
            r#"SELECT id, user_id, status, total_cents, created_at
               FROM orders WHERE user_id = $1
               ORDER BY created_at DESC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|r| Order {
                id: r.get("id"),
                user_id: r.get("user_id"),
                status: r.get("status"),
                total_cents: r.get("total_cents"),
                created_at: r.get("created_at"),
            })
            .collect())
    }
}
