use axum::{Json, Router, routing::post};
use serde_json::{Value, json};

use crate::presentation::http::error::AppError;
use crate::presentation::pipeline::Ctx;

/// Acknowledges a payment-provider event. Events are identified by their
/// `type` field.
pub async fn webhook(ctx: Ctx) -> Result<Json<Value>, AppError> {
    let Some(event_type) = ctx.0.body.get("type").and_then(Value::as_str) else {
        return Err(AppError::BadRequest("Webhook event is missing a type".into()));
    };
    let event_id = ctx.0.body.get("id").and_then(Value::as_str).unwrap_or("-");
    tracing::info!(event_type, event_id, "payment_event_received");
    Ok(Json(json!({ "received": true })))
}

pub fn routes() -> Router {
    Router::new().route("/webhook", post(webhook))
}
