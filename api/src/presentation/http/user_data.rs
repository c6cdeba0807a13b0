use axum::{Json, Router, routing::get};
use serde_json::{Map, Value};

use crate::presentation::http::Item;
use crate::presentation::http::error::AppError;
use crate::presentation::pipeline::Ctx;

/// Session key holding the client's free-form data bag. Kept apart from the
/// signed-in user so clients cannot write their own identity.
pub const USER_DATA_KEY: &str = "user_data";

fn current_bag(ctx: &Ctx) -> Result<Map<String, Value>, AppError> {
    Ok(ctx
        .session()?
        .get_as::<Map<String, Value>>(USER_DATA_KEY)
        .unwrap_or_default())
}

/// Applies `patch` to `bag`: `null` removes a key, anything else replaces it.
pub fn merge(bag: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        if value.is_null() {
            bag.remove(key);
        } else {
            bag.insert(key.clone(), value.clone());
        }
    }
}

pub async fn get_user_data(ctx: Ctx) -> Result<Json<Item<Map<String, Value>>>, AppError> {
    Ok(Json(Item::new(current_bag(&ctx)?)))
}

pub async fn put_user_data(ctx: Ctx) -> Result<Json<Item<Map<String, Value>>>, AppError> {
    let Some(patch) = ctx.0.body.as_object() else {
        return Err(AppError::BadRequest("Expected a JSON object".into()));
    };
    let mut bag = current_bag(&ctx)?;
    merge(&mut bag, patch);
    ctx.session()?.insert(USER_DATA_KEY, Value::Object(bag.clone()));
    Ok(Json(Item::new(bag)))
}

pub fn routes() -> Router {
    Router::new().route("/", get(get_user_data).put(put_user_data))
}
