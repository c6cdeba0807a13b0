use async_trait::async_trait;
use axum::{http::header, response::Response};

use crate::presentation::http::error::AppError;
use crate::presentation::pipeline::{Flow, RequestContext, Stage};

/// One line per request in development mode:
/// `GET /api/products 200 3.127 ms - 512`.
pub struct AccessLog;

pub fn access_line(ctx: &RequestContext, res: &Response) -> String {
    let elapsed_ms = ctx.started.elapsed().as_secs_f64() * 1000.0;
    let length = res
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    format!(
        "{} {} {} {:.3} ms - {}",
        ctx.method,
        ctx.original_uri,
        res.status().as_u16(),
        elapsed_ms,
        length
    )
}

#[async_trait]
impl Stage for AccessLog {
    fn name(&self) -> &'static str {
        "access_log"
    }

    async fn on_request(&self, _ctx: &mut RequestContext) -> Result<Flow, AppError> {
        Ok(Flow::Next)
    }

    async fn on_response(&self, ctx: &RequestContext, res: &mut Response) {
        tracing::info!(target: "storefront::access", "{}", access_line(ctx, res));
    }
}
