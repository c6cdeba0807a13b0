use async_trait::async_trait;

use crate::application::services::sanitize::{neutralize_markup, neutralize_markup_map};
use crate::presentation::http::error::AppError;
use crate::presentation::pipeline::{Flow, RequestContext, Stage};

pub struct MarkupFilter;

#[async_trait]
impl Stage for MarkupFilter {
    fn name(&self) -> &'static str {
        "markup"
    }

    async fn on_request(&self, ctx: &mut RequestContext) -> Result<Flow, AppError> {
        let cleaned = neutralize_markup(&mut ctx.body) + neutralize_markup_map(&mut ctx.query);
        if cleaned > 0 {
            tracing::debug!(path = %ctx.path(), cleaned, "markup_neutralized");
        }
        Ok(Flow::Next)
    }
}
