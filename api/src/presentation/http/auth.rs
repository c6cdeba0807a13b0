use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use uuid::Uuid;

use crate::bootstrap::app_context::AppContext;
use crate::presentation::http::Item;
use crate::presentation::http::admin::UserItem;
use crate::presentation::http::error::AppError;
use crate::presentation::pipeline::Ctx;

/// Session key under which the signed-in user is kept.
pub const SESSION_USER_KEY: &str = "user";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: String,
}

impl SessionUser {
    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

pub fn session_user(ctx: &Ctx) -> Result<SessionUser, AppError> {
    ctx.session()?
        .get_as::<SessionUser>(SESSION_USER_KEY)
        .ok_or_else(|| AppError::Unauthorized("Not authorized to access this route".into()))
}

pub fn require_admin(ctx: &Ctx) -> Result<SessionUser, AppError> {
    let user = session_user(ctx)?;
    if !user.is_admin() {
        return Err(AppError::Forbidden(format!(
            "User role {} is not authorized to access this route",
            user.role
        )));
    }
    Ok(user)
}

/// The signed-in user as currently stored, so role changes and deletions
/// take effect without a new login.
pub async fn me(
    State(ctx): State<AppContext>,
    req: Ctx,
) -> Result<Json<Item<UserItem>>, AppError> {
    let session = session_user(&req)?;
    let user = ctx
        .user_repo()
        .find_by_id(session.id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Not authorized to access this route".into()))?;
    Ok(Json(Item::new(user.into())))
}

pub async fn logout(req: Ctx) -> Result<Json<Value>, AppError> {
    let session = req.session()?;
    let previous = session.id();
    session.regenerate();
    tracing::debug!(session_id = %previous, "session_destroyed");
    Ok(Json(json!({ "success": true, "data": {} })))
}

pub fn routes(ctx: AppContext) -> Router {
    Router::new()
        .route("/me", get(me))
        .route("/logout", post(logout))
        .with_state(ctx)
}
