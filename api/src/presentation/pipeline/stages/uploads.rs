use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Multipart, Request, multipart::MultipartError},
    http::StatusCode,
};
use serde_json::Value;

use crate::application::services::query;
use crate::presentation::http::error::AppError;
use crate::presentation::pipeline::{Flow, RequestContext, Stage, UploadedFile};

/// Buffers `multipart/form-data` uploads into `ctx.files`. Text fields are
/// merged into the body object.
pub struct Uploads {
    limit: usize,
}

impl Uploads {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    fn too_large(&self) -> AppError {
        AppError::PayloadTooLarge(format!("upload exceeds {} bytes", self.limit))
    }
}

fn field_error(err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge(err.body_text())
    } else {
        AppError::BadRequest(err.body_text())
    }
}

#[async_trait]
impl Stage for Uploads {
    fn name(&self) -> &'static str {
        "uploads"
    }

    async fn on_request(&self, ctx: &mut RequestContext) -> Result<Flow, AppError> {
        if ctx.content_type().as_deref() != Some("multipart/form-data") {
            return Ok(Flow::Next);
        }
        if ctx.declared_length().is_some_and(|len| len > self.limit) {
            return Err(self.too_large());
        }
        let Some(body) = ctx.take_body() else {
            return Ok(Flow::Next);
        };

        let mut req = Request::new(body);
        *req.headers_mut() = ctx.headers.clone();
        *req.extensions_mut() = ctx.extensions.clone();
        let mut multipart = Multipart::from_request(req, &())
            .await
            .map_err(|rej| AppError::BadRequest(rej.body_text()))?;

        let mut fields: Vec<(String, String)> = Vec::new();
        let mut total = 0usize;
        while let Some(field) = multipart.next_field().await.map_err(field_error)? {
            let name = field.name().unwrap_or_default().to_string();
            let file_name = field.file_name().map(str::to_string);
            match file_name {
                Some(file_name) => {
                    let content_type = field.content_type().map(str::to_string);
                    let data = field.bytes().await.map_err(field_error)?;
                    total += data.len();
                    if total > self.limit {
                        return Err(self.too_large());
                    }
                    ctx.files.push(UploadedFile {
                        field: name,
                        file_name,
                        content_type,
                        data,
                    });
                }
                None => {
                    let text = field.text().await.map_err(field_error)?;
                    fields.push((name, text));
                }
            }
        }

        if let Value::Object(body) = &mut ctx.body {
            body.extend(query::parse_pairs(fields));
        }
        tracing::debug!(files = ctx.files.len(), bytes = total, "multipart_buffered");
        Ok(Flow::Next)
    }
}
