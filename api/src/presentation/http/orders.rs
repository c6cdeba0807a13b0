use axum::{Json, Router, extract::State, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::bootstrap::app_context::AppContext;
use crate::domain::accounts::order::Order;
use crate::presentation::http::Listing;
use crate::presentation::http::auth::session_user;
use crate::presentation::http::error::AppError;
use crate::presentation::pipeline::Ctx;

#[derive(Serialize)]
pub struct OrderItem {
    pub id: Uuid,
    pub status: String,
    pub total_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl From<Order> for OrderItem {
    fn from(o: Order) -> Self {
        OrderItem {
            id: o.id,
            status: o.status,
            total_cents: o.total_cents,
            created_at: o.created_at,
        }
    }
}

pub async fn my_orders(
    State(ctx): State<AppContext>,
    req: Ctx,
) -> Result<Json<Listing<OrderItem>>, AppError> {
    let user = session_user(&req)?;
    let orders = ctx.order_repo().list_for_user(user.id).await?;
    Ok(Json(Listing::new(orders.into_iter().map(Into::into).collect())))
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new().route("/", get(my_orders)).with_state(ctx)
}
