use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use uuid::Uuid;

use crate::bootstrap::app_context::AppContext;
use crate::domain::catalog::product::Category;
use crate::presentation::http::Listing;
use crate::presentation::http::error::AppError;

#[derive(Serialize)]
pub struct CategoryItem {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl From<Category> for CategoryItem {
    fn from(c: Category) -> Self {
        CategoryItem {
            id: c.id,
            name: c.name,
            slug: c.slug,
        }
    }
}

pub async fn list_categories(
    State(ctx): State<AppContext>,
) -> Result<Json<Listing<CategoryItem>>, AppError> {
    let items = ctx.catalog_repo().list_categories().await?;
    Ok(Json(Listing::new(items.into_iter().map(Into::into).collect())))
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new().route("/", get(list_categories)).with_state(ctx)
}
