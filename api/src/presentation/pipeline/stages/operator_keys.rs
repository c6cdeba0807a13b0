use async_trait::async_trait;

use crate::application::services::sanitize::{strip_operator_keys, strip_operator_keys_map};
use crate::presentation::http::error::AppError;
use crate::presentation::pipeline::{Flow, RequestContext, Stage};

/// Drops `$`-prefixed and dotted keys from body and query.
pub struct OperatorKeyFilter;

#[async_trait]
impl Stage for OperatorKeyFilter {
    fn name(&self) -> &'static str {
        "operator_keys"
    }

    async fn on_request(&self, ctx: &mut RequestContext) -> Result<Flow, AppError> {
        let removed = strip_operator_keys(&mut ctx.body) + strip_operator_keys_map(&mut ctx.query);
        if removed > 0 {
            tracing::warn!(
                client = %ctx.client_key(),
                path = %ctx.path(),
                removed,
                "operator_keys_stripped"
            );
        }
        Ok(Flow::Next)
    }
}
