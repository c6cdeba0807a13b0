#![allow(dead_code)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response},
};
use chrono::Utc;
use serde_json::{Map, Value};
use tower::ServiceExt;
use uuid::Uuid;

use storefront::application::ports::catalog_repository::CatalogRepository;
use storefront::application::ports::database_connector::DatabaseConnector;
use storefront::application::ports::order_repository::OrderRepository;
use storefront::application::ports::session_store::SessionStore;
use storefront::application::ports::user_repository::UserRepository;
use storefront::bootstrap::app_context::AppServices;
use storefront::bootstrap::config::Config;
use storefront::bootstrap::startup;
use storefront::domain::accounts::order::Order;
use storefront::domain::accounts::user::User;
use storefront::domain::catalog::discount::Discount;
use storefront::domain::catalog::product::{Category, Product};
use storefront::domain::sessions::session::SessionRecord;
use storefront::infrastructure::crypto::sign_value;
use storefront::infrastructure::session::MemorySessionStore;

pub const SECRET: &str = "integration-secret";

#[derive(Default)]
pub struct FakeCatalog {
    pub categories: Vec<Category>,
    pub products: Vec<Product>,
    pub discounts: Vec<Discount>,
}

#[async_trait]
impl CatalogRepository for FakeCatalog {
    async fn list_categories(&self) -> anyhow::Result<Vec<Category>> {
        Ok(self.categories.clone())
    }

    async fn list_products(&self, category: Option<&str>) -> anyhow::Result<Vec<Product>> {
        let Some(slug) = category else {
            return Ok(self.products.clone());
        };
        let ids: Vec<Uuid> = self
            .categories
            .iter()
            .filter(|c| c.slug == slug)
            .map(|c| c.id)
            .collect();
        Ok(self
            .products
            .iter()
            .filter(|p| p.category_id.is_some_and(|id| ids.contains(&id)))
            .cloned()
            .collect())
    }

    async fn get_product(&self, id: Uuid) -> anyhow::Result<Option<Product>> {
        Ok(self.products.iter().find(|p| p.id == id).cloned())
    }

    async fn find_discount(&self, code: &str) -> anyhow::Result<Option<Discount>> {
        Ok(self.discounts.iter().find(|d| d.code == code).cloned())
    }
}

#[derive(Default)]
pub struct FakeUsers(pub Vec<User>);

#[async_trait]
impl UserRepository for FakeUsers {
    async fn list_users(&self) -> anyhow::Result<Vec<User>> {
        Ok(self.0.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.0.iter().find(|u| u.id == id).cloned())
    }
}

#[derive(Default)]
pub struct FakeOrders(pub Vec<Order>);

#[async_trait]
impl OrderRepository for FakeOrders {
    async fn list_for_user(&self, user_id: Uuid) -> anyhow::Result<Vec<Order>> {
        Ok(self.0.iter().filter(|o| o.user_id == user_id).cloned().collect())
    }
}

pub struct Fixture {
    pub shoes: Category,
    pub sneaker: Product,
    pub boot: Product,
    pub admin: User,
    pub shopper: User,
}

pub fn fixture() -> Fixture {
    let shoes = Category {
        id: Uuid::new_v4(),
        name: "Shoes".into(),
        slug: "shoes".into(),
    };
    let product = |name: &str, category: Option<Uuid>| Product {
        id: Uuid::new_v4(),
        category_id: category,
        name: name.into(),
        description: None,
        price_cents: 4999,
        stock: 3,
        image_url: None,
        created_at: Utc::now(),
    };
    let user = |name: &str, role: &str| User {
        id: Uuid::new_v4(),
        name: name.into(),
        email: format!("{}@example.com", name),
        role: role.into(),
        created_at: Utc::now(),
    };
    Fixture {
        sneaker: product("Sneaker", Some(shoes.id)),
        boot: product("Boot", None),
        shoes,
        admin: user("ada", "admin"),
        shopper: user("sam", "user"),
    }
}

pub fn services(fx: &Fixture) -> AppServices {
    AppServices::new(
        Arc::new(FakeCatalog {
            categories: vec![fx.shoes.clone()],
            products: vec![fx.sneaker.clone(), fx.boot.clone()],
            discounts: vec![
                Discount {
                    id: Uuid::new_v4(),
                    code: "SPRING10".into(),
                    percent_off: 10,
                    expires_at: None,
                },
                Discount {
                    id: Uuid::new_v4(),
                    code: "OLD".into(),
                    percent_off: 50,
                    expires_at: Some(Utc::now() - chrono::Duration::days(1)),
                },
            ],
        }),
        Arc::new(FakeUsers(vec![fx.admin.clone(), fx.shopper.clone()])),
        Arc::new(FakeOrders(vec![Order {
            id: Uuid::new_v4(),
            user_id: fx.shopper.id,
            status: "paid".into(),
            total_cents: 4999,
            created_at: Utc::now(),
        }])),
    )
}

/// Connector double: hands out the fixture services, or fails like an
/// unreachable database.
pub struct FakeConnector {
    pub fail: bool,
}

#[async_trait]
impl DatabaseConnector for FakeConnector {
    async fn connect(&self, _cfg: &Config) -> anyhow::Result<AppServices> {
        if self.fail {
            anyhow::bail!("connection refused");
        }
        Ok(services(&fixture()))
    }
}

pub fn config(public_dir: &Path, extra: &[(&str, &str)]) -> Config {
    let mut vars: HashMap<String, String> = HashMap::new();
    vars.insert("SESSION_SECRET".into(), SECRET.into());
    vars.insert("PUBLIC_DIR".into(), public_dir.display().to_string());
    for (k, v) in extra {
        vars.insert(k.to_string(), v.to_string());
    }
    Config::from_lookup(|key| vars.get(key).cloned()).unwrap()
}

pub struct TestApp {
    pub router: Router,
    pub sessions: Arc<MemorySessionStore>,
    pub fixture: Fixture,
    pub public: tempfile::TempDir,
}

impl TestApp {
    pub fn new(extra: &[(&str, &str)]) -> Self {
        let public = tempfile::tempdir().unwrap();
        let cfg = config(public.path(), extra);
        let fixture = fixture();
        let sessions = Arc::new(MemorySessionStore::new());
        let router = startup::build_app(
            &cfg,
            services(&fixture),
            sessions.clone(),
            startup::rate_limiter(&cfg),
        );
        Self {
            router,
            sessions,
            fixture,
            public,
        }
    }

    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.unwrap()
    }

    /// Stores a session carrying `user` and returns the matching `Cookie`
    /// header value.
    pub async fn login_as(&self, user: &User) -> String {
        let mut record = SessionRecord::new(Uuid::new_v4().to_string(), chrono::Duration::hours(1));
        let mut data = Map::new();
        data.insert("id".into(), Value::String(user.id.to_string()));
        data.insert("name".into(), Value::String(user.name.clone()));
        data.insert("email".into(), Value::String(user.email.clone()));
        data.insert("role".into(), Value::String(user.role.clone()));
        record.data.insert("user".into(), Value::Object(data));
        self.sessions.save(&record).await.unwrap();
        session_cookie(&record.id)
    }
}

pub fn session_cookie(id: &str) -> String {
    let signed = sign_value(SECRET, id).unwrap();
    format!("connect.sid={}", urlencoding::encode(&format!("s:{}", signed)))
}

pub async fn json_of(res: Response<Body>) -> Value {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn text_of(res: Response<Body>) -> String {
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}
