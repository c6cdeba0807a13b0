use std::any::Any;

use axum::{
    Router,
    extract::{OriginalUri, Request},
    http::{Method, Uri},
    response::{IntoResponse, Response},
};
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;

use crate::presentation::http::error::AppError;

struct RouteEntry {
    prefix: String,
    router: Router,
}

/// Ordered `(prefix, router)` pairs. The longest segment-aligned prefix
/// wins; equal prefixes resolve to the earliest mount.
#[derive(Default)]
pub struct RouterTable {
    entries: Vec<RouteEntry>,
}

fn normalize(prefix: &str) -> String {
    let trimmed = prefix.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

fn covers(prefix: &str, path: &str) -> bool {
    prefix == "/"
        || path == prefix
        || (path.starts_with(prefix) && path.as_bytes().get(prefix.len()) == Some(&b'/'))
}

fn strip<'a>(prefix: &str, path: &'a str) -> &'a str {
    if prefix == "/" {
        return path;
    }
    match &path[prefix.len()..] {
        "" => "/",
        rest => rest,
    }
}

fn rebase(uri: &Uri, path: &str) -> Uri {
    let path_and_query = match uri.query() {
        Some(q) => format!("{}?{}", path, q),
        None => path.to_string(),
    };
    Uri::builder()
        .path_and_query(path_and_query)
        .build()
        .unwrap_or_else(|_| uri.clone())
}

async fn unmatched(method: Method, OriginalUri(uri): OriginalUri) -> AppError {
    AppError::NotFound(format!("Not Found - {} {}", method, uri.path()))
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic".to_string());
    AppError::internal(anyhow::anyhow!("handler panicked: {}", message)).into_response()
}

impl RouterTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mount(mut self, prefix: &str, router: Router) -> Self {
        let router = router
            .fallback(unmatched)
            .method_not_allowed_fallback(unmatched)
            .layer(CatchPanicLayer::custom(panic_response));
        self.entries.push(RouteEntry {
            prefix: normalize(prefix),
            router,
        });
        self
    }

    pub fn prefixes(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.prefix.as_str()).collect()
    }

    /// Index of the entry that handles `path`.
    pub fn resolve(&self, path: &str) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for (idx, entry) in self.entries.iter().enumerate() {
            if !covers(&entry.prefix, path) {
                continue;
            }
            let len = entry.prefix.len();
            if best.is_none_or(|(_, best_len)| len > best_len) {
                best = Some((idx, len));
            }
        }
        best.map(|(idx, _)| idx)
    }

    pub async fn dispatch(&self, mut req: Request) -> Response {
        let original = req.uri().clone();
        let Some(idx) = self.resolve(original.path()) else {
            return AppError::NotFound(format!("Not Found - {} {}", req.method(), original.path()))
                .into_response();
        };
        let entry = &self.entries[idx];
        let local = strip(&entry.prefix, original.path()).to_string();
        *req.uri_mut() = rebase(&original, &local);
        req.extensions_mut().insert(OriginalUri(original));
        match entry.router.clone().oneshot(req).await {
            Ok(res) => res,
            Err(never) => match never {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, routing::get};

    fn named(name: &'static str) -> Router {
        Router::new()
            .route("/", get(move || async move { name }))
            .route("/*rest", get(move || async move { name }))
    }

    fn table() -> RouterTable {
        RouterTable::new()
            .mount("/api/products", named("products"))
            .mount("/api/product", named("product"))
            .mount("/api/products/featured", named("featured"))
            .mount("/api/products", named("shadowed"))
            .mount("/", named("root"))
    }

    #[test]
    fn longest_segment_aligned_prefix_wins() {
        let t = table();
        assert_eq!(t.resolve("/api/products"), Some(0));
        assert_eq!(t.resolve("/api/products/42"), Some(0));
        assert_eq!(t.resolve("/api/productsX"), Some(4));
        assert_eq!(t.resolve("/api/product/1"), Some(1));
        assert_eq!(t.resolve("/api/products/featured/x"), Some(2));
        assert_eq!(t.resolve("/API/products"), Some(4));
        assert_eq!(t.resolve("/webhook"), Some(4));
    }

    #[test]
    fn prefixes_are_normalized() {
        let t = RouterTable::new()
            .mount("api/a/", Router::new())
            .mount("", Router::new());
        assert_eq!(t.prefixes(), vec!["/api/a", "/"]);
    }

    #[test]
    fn stripping_keeps_a_leading_slash() {
        assert_eq!(strip("/api/products", "/api/products"), "/");
        assert_eq!(strip("/api/products", "/api/products/7"), "/7");
        assert_eq!(strip("/", "/webhook"), "/webhook");
    }

    #[tokio::test]
    async fn dispatch_strips_prefix_and_keeps_query() {
        let router = Router::new().route(
            "/:id",
            get(|uri: Uri, OriginalUri(orig): OriginalUri| async move {
                format!("{} {}", uri, orig)
            }),
        );
        let t = RouterTable::new().mount("/api/products", router);
        let req = axum::http::Request::get("/api/products/9?x=1").body(Body::empty()).unwrap();
        let res = t.dispatch(req).await;
        assert_eq!(res.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"/9?x=1 /api/products/9?x=1");
    }

    #[tokio::test]
    async fn unmatched_inside_group_is_not_found() {
        let t = RouterTable::new().mount("/api/products", Router::new().route("/", get(|| async { "" })));
        let req = axum::http::Request::get("/api/products/a/b").body(Body::empty()).unwrap();
        let res = t.dispatch(req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn wrong_method_is_not_found() {
        let t = RouterTable::new().mount("/api/products", Router::new().route("/", get(|| async { "" })));
        let req = axum::http::Request::post("/api/products").body(Body::empty()).unwrap();
        let res = t.dispatch(req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert!(res.extensions().get::<crate::presentation::http::error::Failure>().is_some());
    }

    #[tokio::test]
    async fn panics_become_internal_errors() {
        async fn explode() -> &'static str {
            panic!("boom")
        }
        let router = Router::new().route("/", get(explode));
        let t = RouterTable::new().mount("/explode", router);
        let req = axum::http::Request::get("/explode").body(Body::empty()).unwrap();
        let res = t.dispatch(req).await;
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
