use std::sync::Arc;

use crate::application::ports::catalog_repository::CatalogRepository;
use crate::application::ports::order_repository::OrderRepository;
use crate::application::ports::user_repository::UserRepository;
use crate::bootstrap::config::Config;

/// Router state shared by every route group.
#[derive(Clone)]
pub struct AppContext {
    pub cfg: Config,
    services: Arc<AppServices>,
}

/// Repositories produced by the database connector.
#[derive(Clone)]
pub struct AppServices {
    catalog_repo: Arc<dyn CatalogRepository>,
    user_repo: Arc<dyn UserRepository>,
    order_repo: Arc<dyn OrderRepository>,
}

impl AppServices {
    pub fn new(
        catalog_repo: Arc<dyn CatalogRepository>,
        user_repo: Arc<dyn UserRepository>,
        order_repo: Arc<dyn OrderRepository>,
    ) -> Self {
        Self {
            catalog_repo,
            user_repo,
            order_repo,
        }
    }
}

impl AppContext {
    pub fn new(cfg: Config, services: AppServices) -> Self {
        Self {
            cfg,
            services: Arc::new(services),
        }
    }

    pub fn catalog_repo(&self) -> Arc<dyn CatalogRepository> {
        self.services.catalog_repo.clone()
    }

    pub fn user_repo(&self) -> Arc<dyn UserRepository> {
        self.services.user_repo.clone()
    }

    pub fn order_repo(&self) -> Arc<dyn OrderRepository> {
        self.services.order_repo.clone()
    }
}
