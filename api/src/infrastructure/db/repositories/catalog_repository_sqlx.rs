use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;

use crate::application::ports::catalog_repository::CatalogRepository;
use crate::domain::catalog::discount::Discount;
use crate::domain::catalog::product::{Category, Product};
use crate::infrastructure::db::PgPool;

pub struct SqlxCatalogRepository {
    pub pool: PgPool,
}

impl SqlxCatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn product_from_row(r: &sqlx::postgres::PgRow) -> Product {
    Product {
        id: r.get("id"),
        category_id: r.try_get("category_id").ok().flatten(),
        name: r.get("name"),
        description: r.try_get("description").ok().flatten(),
        price_cents: r.get("price_cents"),
        stock: r.get("stock"),
        image_url: r.try_get("image_url").ok().flatten(),
        created_at: r.get("created_at"),
    }
}

#[async_trait]
impl CatalogRepository for SqlxCatalogRepository {
    async fn list_categories(&self) -> anyhow::Result<Vec<Category>> {
        let rows = sqlx::query(r#"SELECT id, name, slug FROM categories ORDER BY name ASC"#)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows
            .into_iter()
            .map(|r| Category {
                id: r.get("id"),
                name: r.get("name"),
                slug: r.get("slug"),
            })
            .collect())
    }

    async fn list_products(&self, category: Option<&str>) -> anyhow::Result<Vec<Product>> {
        let rows = if let Some(slug) = category.filter(|s| !s.trim().is_empty()) {
            sqlx::query(
                r#"SELECT p.id, p.category_id, p.name, p.description, p.price_cents, p.stock,
                          p.image_url, p.created_at
                   FROM products p
                   JOIN categories c ON c.id = p.category_id
                   WHERE c.slug = $1
                   ORDER BY p.created_at DESC"#,
            )
            .bind(slug)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query(
                r#"SELECT id, category_id, name, description, price_cents, stock, image_url, created_at
                   FROM products ORDER BY created_at DESC"#,
            )
            .fetch_all(&self.pool)
            .await?
        };
        Ok(rows.iter().map(product_from_row).collect())
    }

    async fn get_product(&self, id: Uuid) -> anyhow::Result<Option<Product>> {
        let row = sqlx::query(
            r#"SELECT id, category_id, name, description, price_cents, stock, image_url, created_at
               FROM products WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.as_ref().map(product_from_row))
    }

    async fn find_discount(&self, code: &str) -> anyhow::Result<Option<Discount>> {
        let row = sqlx::query(
            r#"SELECT id, code, percent_off, expires_at FROM discounts WHERE code = $1"#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| Discount {
            id: r.get("id"),
            code: r.get("code"),
            percent_off: r.get("percent_off"),
            expires_at: r.try_get("expires_at").ok().flatten(),
        }))
    }
}
