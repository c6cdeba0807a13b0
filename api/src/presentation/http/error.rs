use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::bootstrap::config::AppMode;

/// Every failure a pipeline stage or route handler can propagate.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("Too many requests, please try again later.")]
    TooManyRequests { retry_after: Duration },
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("Server Error")]
    Internal(#[source] anyhow::Error),
}

impl AppError {
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        AppError::Internal(err.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AppError::BadRequest(_) => "BadRequest",
            AppError::PayloadTooLarge(_) => "PayloadTooLarge",
            AppError::TooManyRequests { .. } => "TooManyRequests",
            AppError::NotFound(_) => "NotFound",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::Forbidden(_) => "Forbidden",
            AppError::Internal(_) => "InternalError",
        }
    }

    /// Renders the JSON envelope. `verbose` adds the error chain of internal
    /// failures under `detail`.
    pub fn to_response(&self, verbose: bool) -> Response {
        let detail = match self {
            AppError::Internal(err) if verbose => Some(format!("{:#}", err)),
            _ => None,
        };
        let body = ErrorBody {
            success: false,
            status: self.status().as_u16(),
            kind: self.kind(),
            error: self.to_string(),
            detail,
        };
        let mut res = (self.status(), Json(body)).into_response();
        if let AppError::TooManyRequests { retry_after } = self {
            let secs = retry_after.as_secs().max(1);
            if let Ok(v) = HeaderValue::from_str(&secs.to_string()) {
                res.headers_mut().insert(header::RETRY_AFTER, v);
            }
        }
        res
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    status: u16,
    kind: &'static str,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

/// Marks a response produced from an `AppError` so the boundary can render
/// it again under the process mode.
#[derive(Clone)]
pub struct Failure(pub Arc<AppError>);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let mut res = self.to_response(false);
        res.extensions_mut().insert(Failure(Arc::new(self)));
        res
    }
}

/// Sole translator from failure to HTTP response.
#[derive(Clone, Debug)]
pub struct ErrorBoundary {
    verbose: bool,
}

impl ErrorBoundary {
    pub fn new(mode: &AppMode) -> Self {
        Self {
            verbose: mode.is_development(),
        }
    }

    pub fn render(&self, err: &AppError) -> Response {
        match err {
            AppError::Internal(inner) => tracing::error!(error = ?inner, "request_failed"),
            other => tracing::debug!(kind = other.kind(), error = %other, "request_rejected"),
        }
        let mut res = err.to_response(self.verbose);
        res.extensions_mut().insert(Failure(Arc::new(clone_for_marker(err))));
        res
    }

    /// Re-renders responses that carry a `Failure` marker; passes the rest
    /// through.
    pub fn review(&self, res: Response) -> Response {
        match res.extensions().get::<Failure>().cloned() {
            Some(Failure(err)) => self.render(&err),
            None => res,
        }
    }
}

// The marker only needs kind and message downstream; internal sources are
// flattened to their rendered chain.
fn clone_for_marker(err: &AppError) -> AppError {
    match err {
        AppError::BadRequest(m) => AppError::BadRequest(m.clone()),
        AppError::PayloadTooLarge(m) => AppError::PayloadTooLarge(m.clone()),
        AppError::TooManyRequests { retry_after } => AppError::TooManyRequests {
            retry_after: *retry_after,
        },
        AppError::NotFound(m) => AppError::NotFound(m.clone()),
        AppError::Unauthorized(m) => AppError::Unauthorized(m.clone()),
        AppError::Forbidden(m) => AppError::Forbidden(m.clone()),
        AppError::Internal(inner) => AppError::Internal(anyhow::anyhow!("{:#}", inner)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn json_of(res: Response) -> Value {
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn envelope_shape() {
        let boundary = ErrorBoundary::new(&AppMode::Production);
        let res = boundary.render(&AppError::NotFound("Not Found - /x".into()));
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body = json_of(res).await;
        assert_eq!(body["success"], Value::Bool(false));
        assert_eq!(body["status"], 404);
        assert_eq!(body["kind"], "NotFound");
        assert_eq!(body["error"], "Not Found - /x");
    }

    #[tokio::test]
    async fn internal_detail_hidden_outside_development() {
        let err = AppError::internal(anyhow::anyhow!("pool timed out"));
        let quiet = json_of(ErrorBoundary::new(&AppMode::Production).render(&err)).await;
        assert_eq!(quiet["error"], "Server Error");
        assert!(quiet.get("detail").is_none());

        let loud = json_of(ErrorBoundary::new(&AppMode::Development).render(&err)).await;
        assert_eq!(loud["error"], "Server Error");
        assert!(loud["detail"].as_str().unwrap().contains("pool timed out"));
    }

    #[tokio::test]
    async fn review_rerenders_marked_responses() {
        let handler_res = AppError::internal(anyhow::anyhow!("boom")).into_response();
        let res = ErrorBoundary::new(&AppMode::Development).review(handler_res);
        let body = json_of(res).await;
        assert!(body["detail"].as_str().unwrap().contains("boom"));
    }

    #[test]
    fn too_many_requests_sets_retry_after() {
        let err = AppError::TooManyRequests {
            retry_after: Duration::from_secs(42),
        };
        let res = err.to_response(false);
        assert_eq!(res.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(res.headers()[header::RETRY_AFTER], "42");
    }
}
