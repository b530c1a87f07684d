// Route exports
pub mod compare;
pub mod meta;

use crate::core::Comparator;
use crate::models::ErrorResponse;
use actix_web::{error, http::StatusCode, web, HttpResponse};
use std::sync::Arc;
use std::time::Instant;

pub use compare::{MISSING_MIXED_INPUTS, MISSING_URLS};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub comparator: Arc<Comparator>,
    pub started_at: Instant,
    pub max_upload_bytes: u64,
}

impl AppState {
    pub fn new(comparator: Comparator, max_upload_bytes: u64) -> Self {
        Self {
            comparator: Arc::new(comparator),
            started_at: Instant::now(),
            max_upload_bytes,
        }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(meta::configure)
        .service(web::scope("/api").configure(compare::configure));
}

/// Error carrying its HTTP status, rendered as the `{error}` envelope
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl std::error::Error for ApiError {}

impl error::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status).json(ErrorResponse::new(self.message.clone()))
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    ApiError {
        status: StatusCode::BAD_REQUEST,
        message: format!("Invalid JSON: {}", err),
    }
    .into()
}
