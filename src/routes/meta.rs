use crate::models::{EndpointList, HealthResponse, IndexResponse};
use crate::routes::AppState;
use actix_web::{web, HttpResponse, Responder};

pub const SERVICE_NAME: &str = "Face Detection API (ArcFace)";

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/", web::get().to(index))
        .route("/healthz", web::get().to(healthz));
}

/// Static service metadata
async fn index() -> impl Responder {
    HttpResponse::Ok().json(IndexResponse {
        name: SERVICE_NAME.to_string(),
        status: "running".to_string(),
        endpoints: EndpointList {
            compare_faces: "POST /api/compare-faces".to_string(),
            compare_mixed: "POST /api/compare-mixed".to_string(),
        },
    })
}

/// Liveness: uptime in seconds, a fixed message and the local time
async fn healthz(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        uptime: state.started_at.elapsed().as_secs_f64(),
        message: "Ok".to_string(),
        date: chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.6f").to_string(),
    })
}
