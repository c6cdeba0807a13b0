use async_trait::async_trait;
use axum::{
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::presentation::http::error::AppError;
use crate::presentation::pipeline::{Flow, RequestContext, Stage};

const ALLOWED_METHODS: &str = "GET,HEAD,PUT,PATCH,POST,DELETE";

/// Reflects whatever `Origin` the request carries and answers preflights
/// itself.
pub struct Cors;

#[async_trait]
impl Stage for Cors {
    fn name(&self) -> &'static str {
        "cors"
    }

    async fn on_request(&self, ctx: &mut RequestContext) -> Result<Flow, AppError> {
        if ctx.method != Method::OPTIONS {
            return Ok(Flow::Next);
        }
        let mut res = StatusCode::NO_CONTENT.into_response();
        let headers = res.headers_mut();
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        if let Some(requested) = ctx.headers.get(header::ACCESS_CONTROL_REQUEST_HEADERS) {
            headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, requested.clone());
            headers.append(
                header::VARY,
                HeaderValue::from_static("Access-Control-Request-Headers"),
            );
        }
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("0"));
        Ok(Flow::Respond(res))
    }

    async fn on_response(&self, ctx: &RequestContext, res: &mut Response) {
        let headers = res.headers_mut();
        if let Some(origin) = ctx.headers.get(header::ORIGIN) {
            headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        }
        headers.append(header::VARY, HeaderValue::from_static("Origin"));
    }
}
