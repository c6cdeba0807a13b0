use std::sync::Arc;

use crate::application::ports::session_store::SessionStore;
use crate::application::services::rate_limit::SlidingWindowLimiter;
use crate::bootstrap::config::Config;
use crate::presentation::pipeline::Stage;

pub mod access_log;
pub mod body;
pub mod cookies;
pub mod cors;
pub mod markup;
pub mod operator_keys;
pub mod pollution;
pub mod rate_limit;
pub mod security_headers;
pub mod session;
pub mod static_files;
pub mod uploads;

/// The storefront's stage order. The access log is only present in
/// development mode.
pub fn standard(
    cfg: &Config,
    sessions: Arc<dyn SessionStore>,
    limiter: Arc<SlidingWindowLimiter>,
) -> Vec<Box<dyn Stage>> {
    let mut stages: Vec<Box<dyn Stage>> = vec![
        Box::new(body::BodyParser::new(cfg.body_limit_bytes)),
        Box::new(cookies::CookieParser),
        Box::new(session::SessionStage::new(
            sessions,
            cfg.session_secret.clone(),
            cfg.session_ttl_secs,
        )),
    ];
    if cfg.mode.is_development() {
        stages.push(Box::new(access_log::AccessLog));
    }
    stages.push(Box::new(uploads::Uploads::new(cfg.upload_max_bytes)));
    stages.push(Box::new(operator_keys::OperatorKeyFilter));
    stages.push(Box::new(security_headers::SecurityHeaders));
    stages.push(Box::new(markup::MarkupFilter));
    stages.push(Box::new(rate_limit::RateLimit::new(limiter)));
    stages.push(Box::new(pollution::ParameterPollution));
    stages.push(Box::new(cors::Cors));
    stages.push(Box::new(static_files::StaticFiles::new(cfg.public_dir.clone())));
    stages
}
