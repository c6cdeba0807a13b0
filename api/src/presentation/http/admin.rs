use axum::{Json, Router, extract::State, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::bootstrap::app_context::AppContext;
use crate::domain::accounts::user::User;
use crate::presentation::http::Listing;
use crate::presentation::http::auth::require_admin;
use crate::presentation::http::error::AppError;
use crate::presentation::pipeline::Ctx;

#[derive(Serialize)]
pub struct UserItem {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserItem {
    fn from(u: User) -> Self {
        UserItem {
            id: u.id,
            name: u.name,
            email: u.email,
            role: u.role,
            created_at: u.created_at,
        }
    }
}

pub async fn list_users(
    State(ctx): State<AppContext>,
    req: Ctx,
) -> Result<Json<Listing<UserItem>>, AppError> {
    let admin = require_admin(&req)?;
    tracing::debug!(admin_id = %admin.id, "admin_list_users");
    let users = ctx.user_repo().list_users().await?;
    Ok(Json(Listing::new(users.into_iter().map(Into::into).collect())))
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new().route("/", get(list_users)).with_state(ctx)
}
