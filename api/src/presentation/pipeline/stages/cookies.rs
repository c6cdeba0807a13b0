use std::collections::HashMap;

use async_trait::async_trait;
use axum::http::{HeaderMap, header};

use crate::presentation::http::error::AppError;
use crate::presentation::pipeline::{Flow, RequestContext, Stage};

pub struct CookieParser;

/// Collects `name=value` pairs from every `Cookie` header. The first
/// occurrence of a name wins; values are percent-decoded when possible.
pub fn parse_cookies(headers: &HeaderMap) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for raw in headers.get_all(header::COOKIE) {
        let Ok(raw) = raw.to_str() else { continue };
        for part in raw.split(';') {
            let Some((name, value)) = part.split_once('=') else { continue };
            let name = name.trim();
            if name.is_empty() || out.contains_key(name) {
                continue;
            }
            let value = value.trim();
            let value = value
                .strip_prefix('"')
                .and_then(|v| v.strip_suffix('"'))
                .unwrap_or(value);
            let decoded = urlencoding::decode(value)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_string());
            out.insert(name.to_string(), decoded);
        }
    }
    out
}

#[async_trait]
impl Stage for CookieParser {
    fn name(&self) -> &'static str {
        "cookies"
    }

    async fn on_request(&self, ctx: &mut RequestContext) -> Result<Flow, AppError> {
        ctx.cookies = parse_cookies(&ctx.headers);
        Ok(Flow::Next)
    }
}
