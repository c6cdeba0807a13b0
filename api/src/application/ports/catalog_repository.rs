use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::catalog::discount::Discount;
use crate::domain::catalog::product::{Category, Product};

#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn list_categories(&self) -> anyhow::Result<Vec<Category>>;
    async fn list_products(&self, category: Option<&str>) -> anyhow::Result<Vec<Product>>;
    async fn get_product(&self, id: Uuid) -> anyhow::Result<Option<Product>>;
    async fn find_discount(&self, code: &str) -> anyhow::Result<Option<Discount>>;
}
