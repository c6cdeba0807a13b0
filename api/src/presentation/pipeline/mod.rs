//! The ordered chain every request passes through before routing.
//!
//! Each [`Stage`] sees the request on the way in and may continue, answer
//! directly, or fail. Failures go straight to the error boundary; later stages
//! are skipped. On the way out every stage that was reached gets to decorate
//! the final response, innermost first.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    extract::{ConnectInfo, Request, State},
    response::Response,
};

use crate::presentation::http::error::{AppError, ErrorBoundary};
use crate::presentation::http::router_table::RouterTable;

pub mod context;
pub mod stages;

pub use context::{Ctx, RequestContext, UploadedFile};

pub enum Flow {
    Next,
    Respond(Response),
}

#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;

    async fn on_request(&self, ctx: &mut RequestContext) -> Result<Flow, AppError>;

    async fn on_response(&self, _ctx: &RequestContext, _res: &mut Response) {}
}

pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
    routes: RouterTable,
    boundary: ErrorBoundary,
}

impl Pipeline {
    pub fn new(stages: Vec<Box<dyn Stage>>, routes: RouterTable, boundary: ErrorBoundary) -> Self {
        Self {
            stages,
            routes,
            boundary,
        }
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn routes(&self) -> &RouterTable {
        &self.routes
    }

    pub async fn handle(&self, req: Request, client: Option<SocketAddr>) -> Response {
        let (mut parts, body) = req.into_parts();
        let mut ctx = RequestContext::new(&parts, client.map(|addr| addr.ip()), body);

        let mut reached = 0;
        let mut outcome: Option<Result<Response, AppError>> = None;
        for stage in &self.stages {
            reached += 1;
            match stage.on_request(&mut ctx).await {
                Ok(Flow::Next) => {}
                Ok(Flow::Respond(res)) => {
                    tracing::trace!(stage = stage.name(), "stage_responded");
                    outcome = Some(Ok(res));
                    break;
                }
                Err(err) => {
                    tracing::trace!(stage = stage.name(), kind = err.kind(), "stage_failed");
                    outcome = Some(Err(err));
                    break;
                }
            }
        }

        let mut response = match outcome {
            Some(Ok(res)) => res,
            Some(Err(err)) => self.boundary.render(&err),
            None => {
                parts.uri = ctx.uri.clone();
                parts.extensions.insert(ctx.clone());
                let body = ctx.take_body().unwrap_or_else(Body::empty);
                let res = self.routes.dispatch(Request::from_parts(parts, body)).await;
                self.boundary.review(res)
            }
        };

        for stage in self.stages[..reached].iter().rev() {
            stage.on_response(&ctx, &mut response).await;
        }
        response
    }

    /// Wraps the pipeline as the fallback of an otherwise empty router so
    /// every method and path enters it.
    pub fn into_router(self: Arc<Self>) -> Router {
        Router::new().fallback(enter).with_state(self)
    }
}

async fn enter(
    State(pipeline): State<Arc<Pipeline>>,
    connect: Option<ConnectInfo<SocketAddr>>,
    req: Request,
) -> Response {
    pipeline
        .handle(req, connect.map(|ConnectInfo(addr)| addr))
        .await
}
