use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use axum::{
    http::{HeaderValue, header},
    response::Response,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use crate::application::ports::session_store::SessionStore;
use crate::domain::sessions::session::SessionRecord;
use crate::infrastructure::crypto::{sign_value, unsign_value};
use crate::presentation::http::error::AppError;
use crate::presentation::pipeline::{Flow, RequestContext, Stage};

pub const SESSION_COOKIE: &str = "connect.sid";

struct SessionState {
    record: SessionRecord,
    is_new: bool,
    retired: Option<String>,
}

/// Handle to the current request's session. Clones share the same state, so
/// writes made by a handler are visible when the session is saved.
#[derive(Clone)]
pub struct Session {
    inner: Arc<Mutex<SessionState>>,
}

impl Session {
    fn new(record: SessionRecord, is_new: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionState {
                record,
                is_new,
                retired: None,
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> String {
        self.state().record.id.clone()
    }

    pub fn is_new(&self) -> bool {
        self.state().is_new
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.state().record.data.get(key).cloned()
    }

    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| serde_json::from_value(v).ok())
    }

    pub fn insert(&self, key: impl Into<String>, value: Value) {
        self.state().record.data.insert(key.into(), value);
    }

    /// Drops all data and moves the session to a fresh id. The old record is
    /// destroyed and a new cookie issued when the response is written.
    pub fn regenerate(&self) {
        let mut state = self.state();
        let fresh = Uuid::new_v4().to_string();
        let old = std::mem::replace(&mut state.record.id, fresh);
        state.record.data.clear();
        if !state.is_new {
            state.retired.get_or_insert(old);
        }
        state.is_new = true;
    }

    fn snapshot(&self) -> SessionRecord {
        self.state().record.clone()
    }

    fn take_retired(&self) -> Option<String> {
        self.state().retired.take()
    }
}

/// Resolves the session named by the signed `connect.sid` cookie, or starts
/// a fresh one. Every session is saved after the handler with a sliding
/// expiry.
pub struct SessionStage {
    store: Arc<dyn SessionStore>,
    secret: String,
    ttl: chrono::Duration,
}

impl SessionStage {
    pub fn new(store: Arc<dyn SessionStore>, secret: impl Into<String>, ttl_secs: i64) -> Self {
        Self {
            store,
            secret: secret.into(),
            ttl: chrono::Duration::seconds(ttl_secs),
        }
    }

    async fn resolve(&self, cookie: &str) -> Result<Option<SessionRecord>, AppError> {
        let Some(id) = cookie
            .strip_prefix("s:")
            .and_then(|signed| unsign_value(&self.secret, signed))
        else {
            tracing::debug!("session_cookie_rejected");
            return Ok(None);
        };
        Ok(self.store.load(&id).await?)
    }

    fn cookie_for(&self, id: &str) -> anyhow::Result<HeaderValue> {
        let signed = sign_value(&self.secret, id)?;
        let value = urlencoding::encode(&format!("s:{}", signed)).into_owned();
        Ok(HeaderValue::from_str(&format!(
            "{}={}; Path=/; HttpOnly",
            SESSION_COOKIE, value
        ))?)
    }
}

#[async_trait]
impl Stage for SessionStage {
    fn name(&self) -> &'static str {
        "session"
    }

    async fn on_request(&self, ctx: &mut RequestContext) -> Result<Flow, AppError> {
        let existing = match ctx.cookies.get(SESSION_COOKIE) {
            Some(cookie) => self.resolve(cookie).await?,
            None => None,
        };
        let session = match existing {
            Some(record) => Session::new(record, false),
            None => Session::new(SessionRecord::new(Uuid::new_v4().to_string(), self.ttl), true),
        };
        ctx.session = Some(session);
        Ok(Flow::Next)
    }

    async fn on_response(&self, ctx: &RequestContext, res: &mut Response) {
        let Some(session) = &ctx.session else {
            return;
        };
        if let Some(old) = session.take_retired() {
            if let Err(err) = self.store.destroy(&old).await {
                tracing::error!(error = ?err, session_id = %old, "session_destroy_failed");
            }
        }
        let mut record = session.snapshot();
        record.touch(self.ttl);
        if let Err(err) = self.store.save(&record).await {
            tracing::error!(error = ?err, session_id = %record.id, "session_save_failed");
            return;
        }
        if session.is_new() {
            match self.cookie_for(&record.id) {
                Ok(cookie) => {
                    res.headers_mut().append(header::SET_COOKIE, cookie);
                }
                Err(err) => tracing::error!(error = ?err, "session_cookie_failed"),
            }
        }
    }
}
