use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use async_trait::async_trait;
use axum::{
    body::{Body, Bytes},
    extract::FromRequestParts,
    http::{Extensions, HeaderMap, Method, Uri, header, request::Parts},
};
use serde_json::{Map, Value};

use crate::application::services::query;
use crate::application::services::rate_limit::Quota;
use crate::presentation::http::error::AppError;
use crate::presentation::pipeline::stages::session::Session;

/// One buffered multipart file.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// The unread request body. Whichever stage consumes it takes it out; the
/// remainder, if any, is forwarded to the routed handler.
#[derive(Clone, Default)]
pub struct RawBody(Arc<Mutex<Option<Body>>>);

impl RawBody {
    fn new(body: Body) -> Self {
        Self(Arc::new(Mutex::new(Some(body))))
    }

    pub fn take(&self) -> Option<Body> {
        self.0.lock().ok().and_then(|mut slot| slot.take())
    }
}

/// Per-request state threaded through the pipeline stages. A clone is
/// placed in the forwarded request's extensions for handlers (see [`Ctx`]).
#[derive(Clone)]
pub struct RequestContext {
    pub method: Method,
    /// URI forwarded to routing; the pollution guard rewrites its query.
    pub uri: Uri,
    pub original_uri: Uri,
    pub headers: HeaderMap,
    pub client_ip: Option<IpAddr>,
    pub started: Instant,
    /// Parsed body; `{}` when the request carried none.
    pub body: Value,
    pub query: Map<String, Value>,
    pub query_polluted: Map<String, Value>,
    pub body_polluted: Map<String, Value>,
    pub cookies: HashMap<String, String>,
    pub session: Option<Session>,
    pub files: Vec<UploadedFile>,
    pub rate_limit: Option<Quota>,
    /// Set when the body arrived URL-encoded.
    pub form_encoded: bool,
    pub(crate) extensions: Extensions,
    raw_body: RawBody,
}

impl RequestContext {
    pub fn new(parts: &Parts, client_ip: Option<IpAddr>, body: Body) -> Self {
        Self {
            method: parts.method.clone(),
            uri: parts.uri.clone(),
            original_uri: parts.uri.clone(),
            headers: parts.headers.clone(),
            client_ip,
            started: Instant::now(),
            body: Value::Object(Map::new()),
            query: query::parse_query(parts.uri.query().unwrap_or_default()),
            query_polluted: Map::new(),
            body_polluted: Map::new(),
            cookies: HashMap::new(),
            session: None,
            files: Vec::new(),
            rate_limit: None,
            form_encoded: false,
            extensions: parts.extensions.clone(),
            raw_body: RawBody::new(body),
        }
    }

    pub fn path(&self) -> &str {
        self.uri.path()
    }

    /// Media type without parameters, lowercased.
    pub fn content_type(&self) -> Option<String> {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_ascii_lowercase())
    }

    pub fn declared_length(&self) -> Option<usize> {
        self.headers
            .get(header::CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse().ok())
    }

    pub fn take_body(&self) -> Option<Body> {
        self.raw_body.take()
    }

    /// Client key used for per-client accounting.
    pub fn client_key(&self) -> String {
        self.client_ip
            .map(|ip| ip.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }
}

/// Handler extractor for the pipeline's view of the request.
pub struct Ctx(pub RequestContext);

#[async_trait]
impl<S> FromRequestParts<S> for Ctx
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .map(Ctx)
            .ok_or_else(|| AppError::internal(anyhow::anyhow!("request context missing")))
    }
}

impl Ctx {
    pub fn session(&self) -> Result<&Session, AppError> {
        self.0
            .session
            .as_ref()
            .ok_or_else(|| AppError::internal(anyhow::anyhow!("session not attached")))
    }
}
