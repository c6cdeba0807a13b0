use std::path::{Path, PathBuf};

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::Request,
    http::Method,
};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use crate::presentation::http::error::AppError;
use crate::presentation::pipeline::{Flow, RequestContext, Stage};

/// Answers `GET`/`HEAD` requests for files under the public directory. A
/// directory is served through its `index.html`.
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn locate(&self, request_path: &str) -> Option<PathBuf> {
        let relative = safe_relative(request_path)?;
        let candidate = self.root.join(relative);
        let meta = tokio::fs::metadata(&candidate).await.ok()?;
        let file = if meta.is_dir() {
            candidate.join("index.html")
        } else {
            candidate
        };
        match tokio::fs::metadata(&file).await {
            Ok(meta) if meta.is_file() => Some(file),
            _ => None,
        }
    }
}

/// Maps a URL path onto a relative filesystem path. Returns `None` for
/// anything that could step outside the root and for dotfiles.
pub fn safe_relative(request_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(request_path).ok()?;
    if !decoded.starts_with('/') || decoded.contains('\\') || decoded.contains('\0') {
        return None;
    }
    let mut out = PathBuf::new();
    for segment in decoded.split('/') {
        match segment {
            "" | "." => continue,
            s if s.starts_with('.') => return None,
            s if Path::new(s).has_root() => return None,
            s => out.push(s),
        }
    }
    Some(out)
}

#[async_trait]
impl Stage for StaticFiles {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn on_request(&self, ctx: &mut RequestContext) -> Result<Flow, AppError> {
        if ctx.method != Method::GET && ctx.method != Method::HEAD {
            return Ok(Flow::Next);
        }
        let Some(file) = self.locate(ctx.path()).await else {
            return Ok(Flow::Next);
        };

        let mut req = Request::new(Body::empty());
        *req.method_mut() = ctx.method.clone();
        *req.uri_mut() = ctx.uri.clone();
        *req.headers_mut() = ctx.headers.clone();
        let res = match ServeFile::new(&file).oneshot(req).await {
            Ok(res) => res,
            Err(never) => match never {},
        };
        tracing::debug!(file = %file.display(), status = res.status().as_u16(), "static_served");
        Ok(Flow::Respond(res.map(Body::new)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_paths_resolve() {
        assert_eq!(safe_relative("/"), Some(PathBuf::new()));
        assert_eq!(
            safe_relative("/img/logo%20large.png"),
            Some(PathBuf::from("img").join("logo large.png"))
        );
        assert_eq!(safe_relative("/a/./b"), Some(PathBuf::from("a").join("b")));
    }

    #[test]
    fn traversal_never_resolves() {
        assert_eq!(safe_relative("/../etc/passwd"), None);
        assert_eq!(safe_relative("/img/%2e%2e/%2e%2e/secret"), None);
        assert_eq!(safe_relative("/img/..%2fsecret"), None);
        assert_eq!(safe_relative("/a%5cb"), None);
        assert_eq!(safe_relative("/a%00b"), None);
    }

    #[test]
    fn dotfiles_are_hidden() {
        assert_eq!(safe_relative("/.env"), None);
        assert_eq!(safe_relative("/%2eenv"), None);
        assert_eq!(safe_relative("/.git/config"), None);
        assert_eq!(safe_relative("/assets/.hidden/app.js"), None);
        assert_eq!(safe_relative("/assets/app.min.js"), Some(PathBuf::from("assets").join("app.min.js")));
    }

    #[tokio::test]
    async fn directory_serves_index() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("docs")).unwrap();
        std::fs::write(dir.path().join("docs").join("index.html"), "<h1>docs</h1>").unwrap();
        std::fs::write(dir.path().join("robots.txt"), "User-agent: *").unwrap();
        let stage = StaticFiles::new(dir.path());

        assert_eq!(
            stage.locate("/docs").await,
            Some(dir.path().join("docs").join("index.html"))
        );
        assert_eq!(stage.locate("/robots.txt").await, Some(dir.path().join("robots.txt")));
        assert_eq!(stage.locate("/missing.txt").await, None);
        assert_eq!(stage.locate("/").await, None);
    }
}
