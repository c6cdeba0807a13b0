use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    http::{HeaderName, HeaderValue},
    response::Response,
};

use crate::application::services::rate_limit::{Decision, Quota, SlidingWindowLimiter};
use crate::presentation::http::error::AppError;
use crate::presentation::pipeline::{Flow, RequestContext, Stage};

const LIMIT: HeaderName = HeaderName::from_static("x-ratelimit-limit");
const REMAINING: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
const RESET: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Per-client admission keyed by peer address. Requests without a known
/// peer share the `unknown` bucket.
pub struct RateLimit {
    limiter: Arc<SlidingWindowLimiter>,
}

impl RateLimit {
    pub fn new(limiter: Arc<SlidingWindowLimiter>) -> Self {
        Self { limiter }
    }
}

/// Unix time, in whole seconds, at which the quota next frees a slot.
fn reset_epoch(quota: &Quota) -> i64 {
    let secs = quota.reset_after.as_secs_f64().ceil() as i64;
    chrono::Utc::now().timestamp() + secs
}

#[async_trait]
impl Stage for RateLimit {
    fn name(&self) -> &'static str {
        "rate_limit"
    }

    async fn on_request(&self, ctx: &mut RequestContext) -> Result<Flow, AppError> {
        let client = ctx.client_key();
        match self.limiter.check(&client) {
            Decision::Allowed(quota) => {
                ctx.rate_limit = Some(quota);
                Ok(Flow::Next)
            }
            Decision::Limited(quota) => {
                ctx.rate_limit = Some(quota);
                tracing::warn!(client = %client, path = %ctx.path(), "rate_limited");
                Err(AppError::TooManyRequests {
                    retry_after: quota.reset_after,
                })
            }
        }
    }

    async fn on_response(&self, ctx: &RequestContext, res: &mut Response) {
        let Some(quota) = ctx.rate_limit else {
            return;
        };
        let headers = res.headers_mut();
        headers.insert(LIMIT, HeaderValue::from(quota.limit));
        headers.insert(REMAINING, HeaderValue::from(quota.remaining));
        headers.insert(RESET, HeaderValue::from(reset_epoch(&quota)));
    }
}
