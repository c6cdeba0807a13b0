use async_trait::async_trait;
use axum::http::Uri;
use serde_json::Value;

use crate::application::services::query;
use crate::presentation::http::error::AppError;
use crate::presentation::pipeline::{Flow, RequestContext, Stage};

/// Collapses repeated query parameters (and top-level arrays of URL-encoded
/// bodies) to their last value, then re-encodes the forwarded query from the
/// cleaned map.
pub struct ParameterPollution;

fn with_query(uri: &Uri, query: &str) -> Uri {
    let path_and_query = if query.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), query)
    };
    Uri::builder()
        .path_and_query(path_and_query)
        .build()
        .unwrap_or_else(|_| uri.clone())
}

#[async_trait]
impl Stage for ParameterPollution {
    fn name(&self) -> &'static str {
        "parameter_pollution"
    }

    async fn on_request(&self, ctx: &mut RequestContext) -> Result<Flow, AppError> {
        ctx.query_polluted = query::collapse_duplicates(&mut ctx.query);
        if ctx.form_encoded {
            if let Value::Object(body) = &mut ctx.body {
                ctx.body_polluted = query::collapse_duplicates(body);
            }
        }
        if ctx.uri.query().is_some() {
            ctx.uri = with_query(&ctx.uri, &query::encode(&ctx.query));
        }
        if !ctx.query_polluted.is_empty() || !ctx.body_polluted.is_empty() {
            tracing::debug!(
                query = ?ctx.query_polluted.keys().collect::<Vec<_>>(),
                body = ?ctx.body_polluted.keys().collect::<Vec<_>>(),
                "parameters_collapsed"
            );
        }
        Ok(Flow::Next)
    }
}
