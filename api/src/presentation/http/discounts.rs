use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::bootstrap::app_context::AppContext;
use crate::domain::catalog::discount::Discount;
use crate::presentation::http::Item;
use crate::presentation::http::error::AppError;

#[derive(Serialize)]
pub struct DiscountItem {
    pub code: String,
    pub percent_off: i32,
    pub expires_at: Option<DateTime<Utc>>,
}

impl From<Discount> for DiscountItem {
    fn from(d: Discount) -> Self {
        DiscountItem {
            code: d.code,
            percent_off: d.percent_off,
            expires_at: d.expires_at,
        }
    }
}

pub async fn get_discount(
    State(ctx): State<AppContext>,
    Path(code): Path<String>,
) -> Result<Json<Item<DiscountItem>>, AppError> {
    let discount = ctx
        .catalog_repo()
        .find_discount(&code)
        .await?
        .filter(|d| d.is_active_at(Utc::now()))
        .ok_or_else(|| AppError::NotFound(format!("Discount code {} is not valid", code)))?;
    Ok(Json(Item::new(discount.into())))
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new().route("/:code", get(get_discount)).with_state(ctx)
}
