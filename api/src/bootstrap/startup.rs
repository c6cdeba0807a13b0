use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{Router, extract::DefaultBodyLimit};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::application::ports::database_connector::DatabaseConnector;
use crate::application::ports::session_store::SessionStore;
use crate::application::services::rate_limit::SlidingWindowLimiter;
use crate::bootstrap::app_context::{AppContext, AppServices};
use crate::bootstrap::config::Config;
use crate::bootstrap::supervisor;
use crate::presentation::http::error::ErrorBoundary;
use crate::presentation::http::router_table::RouterTable;
use crate::presentation::http::{
    admin, auth, categories, discounts, orders, payments, products, user_data,
};
use crate::presentation::pipeline::{Pipeline, stages};

const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("database connection failed: {0:#}")]
    Database(#[source] anyhow::Error),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// The eight route groups in mount order.
pub fn route_table(ctx: &AppContext) -> RouterTable {
    RouterTable::new()
        .mount("/api/categories", categories::routes(ctx.clone()))
        .mount("/api/products", products::routes(ctx.clone()))
        .mount("/api/auth", auth::routes(ctx.clone()))
        .mount("/api/users", admin::routes(ctx.clone()))
        .mount("/api/order", orders::routes(ctx.clone()))
        .mount("/api/user_data", user_data::routes())
        .mount("/api/discount", discounts::routes(ctx.clone()))
        .mount("/", payments::routes())
}

/// Assembles pipeline, route table and error boundary into one router.
pub fn build_app(
    cfg: &Config,
    services: AppServices,
    sessions: Arc<dyn SessionStore>,
    limiter: Arc<SlidingWindowLimiter>,
) -> Router {
    let ctx = AppContext::new(cfg.clone(), services);
    let pipeline = Pipeline::new(
        stages::standard(cfg, sessions, limiter),
        route_table(&ctx),
        ErrorBoundary::new(&cfg.mode),
    );
    tracing::debug!(
        stages = ?pipeline.stage_names(),
        mounts = ?pipeline.routes().prefixes(),
        "pipeline_assembled"
    );

    Arc::new(pipeline)
        .into_router()
        .layer(DefaultBodyLimit::max(cfg.upload_max_bytes))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &http::Request<_>| {
                let method = req.method().clone();
                let uri = req.uri().clone();
                tracing::info_span!("http", %method, %uri)
            }),
        )
}

pub fn rate_limiter(cfg: &Config) -> Arc<SlidingWindowLimiter> {
    Arc::new(SlidingWindowLimiter::new(
        Duration::from_secs(cfg.rate_limit_window_secs),
        cfg.rate_limit_max,
    ))
}

/// A bound, not yet serving, application.
pub struct Server {
    cfg: Config,
    app: Router,
    listener: TcpListener,
    sessions: Arc<dyn SessionStore>,
    limiter: Arc<SlidingWindowLimiter>,
}

/// Connects storage, then binds. The socket is only opened once the
/// database connection is up.
pub async fn prepare(
    cfg: Config,
    connector: &dyn DatabaseConnector,
    sessions: Arc<dyn SessionStore>,
) -> Result<Server, StartupError> {
    let services = connector
        .connect(&cfg)
        .await
        .map_err(StartupError::Database)?;

    let limiter = rate_limiter(&cfg);
    let app = build_app(&cfg, services, sessions.clone(), limiter.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], cfg.port));
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| StartupError::Bind { addr, source })?;

    Ok(Server {
        cfg,
        app,
        listener,
        sessions,
        limiter,
    })
}

impl Server {
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub async fn run(self) -> anyhow::Result<()> {
        let limiter = self.limiter.clone();
        supervisor::supervise_periodic("rate_limit_prune", PRUNE_INTERVAL, move || {
            let limiter = limiter.clone();
            async move {
                let removed = limiter.prune_idle(Instant::now());
                if removed > 0 {
                    tracing::debug!(removed, "rate_limit_clients_pruned");
                }
                anyhow::Ok(())
            }
        });
        let sessions = self.sessions.clone();
        supervisor::supervise_periodic("session_prune", PRUNE_INTERVAL, move || {
            let sessions = sessions.clone();
            async move {
                let removed = sessions.prune_expired().await?;
                if removed > 0 {
                    tracing::debug!(removed, "sessions_pruned");
                }
                anyhow::Ok(())
            }
        });

        let port = self.local_addr().map(|a| a.port()).unwrap_or(self.cfg.port);
        tracing::info!("Server is running on {} mode on port {}", self.cfg.mode, port);
        axum::serve(
            self.listener,
            self.app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await?;
        Ok(())
    }
}
