use async_trait::async_trait;
use serde_json::Value;

use crate::application::services::query;
use crate::presentation::http::error::AppError;
use crate::presentation::pipeline::{Flow, RequestContext, Stage};

enum Encoding {
    Json,
    Form,
}

/// Parses JSON and URL-encoded bodies into `ctx.body`. Other content types
/// are left unread for later stages or the handler.
pub struct BodyParser {
    limit: usize,
}

impl BodyParser {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    fn too_large(&self) -> AppError {
        AppError::PayloadTooLarge(format!("request entity too large (limit {} bytes)", self.limit))
    }
}

fn encoding_of(content_type: &str) -> Option<Encoding> {
    if content_type == "application/json" || content_type.ends_with("+json") {
        Some(Encoding::Json)
    } else if content_type == "application/x-www-form-urlencoded" {
        Some(Encoding::Form)
    } else {
        None
    }
}

/// Only objects and arrays are accepted at the top level.
pub fn parse_json(bytes: &[u8]) -> Result<Value, AppError> {
    let first = bytes.iter().find(|b| !b.is_ascii_whitespace());
    match first {
        None => return Ok(Value::Object(Default::default())),
        Some(b'{') | Some(b'[') => {}
        Some(other) => {
            return Err(AppError::BadRequest(format!(
                "Unexpected token '{}' at start of JSON body",
                char::from(*other)
            )));
        }
    }
    serde_json::from_slice(bytes).map_err(|e| AppError::BadRequest(format!("Malformed JSON body: {}", e)))
}

#[async_trait]
impl Stage for BodyParser {
    fn name(&self) -> &'static str {
        "body"
    }

    async fn on_request(&self, ctx: &mut RequestContext) -> Result<Flow, AppError> {
        let Some(encoding) = ctx.content_type().as_deref().and_then(encoding_of) else {
            return Ok(Flow::Next);
        };
        if ctx.declared_length().is_some_and(|len| len > self.limit) {
            return Err(self.too_large());
        }
        let Some(body) = ctx.take_body() else {
            return Ok(Flow::Next);
        };
        let bytes = axum::body::to_bytes(body, self.limit).await.map_err(|err| {
            tracing::debug!(error = %err, "body_read_failed");
            self.too_large()
        })?;

        match encoding {
            Encoding::Json => ctx.body = parse_json(&bytes)?,
            Encoding::Form => {
                ctx.body = Value::Object(query::parse_pairs(url::form_urlencoded::parse(&bytes)));
                ctx.form_encoded = true;
            }
        }
        Ok(Flow::Next)
    }
}
