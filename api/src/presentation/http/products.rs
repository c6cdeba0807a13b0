use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bootstrap::app_context::AppContext;
use crate::domain::catalog::product::Product;
use crate::presentation::http::error::AppError;
use crate::presentation::http::{Item, Listing};

#[derive(Serialize)]
pub struct ProductItem {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: i32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Product> for ProductItem {
    fn from(p: Product) -> Self {
        ProductItem {
            id: p.id,
            category_id: p.category_id,
            name: p.name,
            description: p.description,
            price_cents: p.price_cents,
            stock: p.stock,
            image_url: p.image_url,
            created_at: p.created_at,
        }
    }
}

#[derive(Deserialize, Default)]
pub struct ProductFilter {
    /// Category slug.
    pub category: Option<String>,
}

pub async fn list_products(
    State(ctx): State<AppContext>,
    Query(filter): Query<ProductFilter>,
) -> Result<Json<Listing<ProductItem>>, AppError> {
    let items = ctx
        .catalog_repo()
        .list_products(filter.category.as_deref())
        .await?;
    Ok(Json(Listing::new(items.into_iter().map(Into::into).collect())))
}

pub async fn get_product(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<Item<ProductItem>>, AppError> {
    let not_found = || AppError::NotFound(format!("Product not found with id of {}", id));
    let uuid = Uuid::parse_str(&id).map_err(|_| not_found())?;
    let product = ctx
        .catalog_repo()
        .get_product(uuid)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(Item::new(product.into())))
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/", get(list_products))
        .route("/:id", get(get_product))
        .with_state(ctx)
}
