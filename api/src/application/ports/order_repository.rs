use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::accounts::order::Order;

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Order>>;
}
