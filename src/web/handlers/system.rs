use actix_web::{web, HttpResponse, Responder};

use crate::web::models::SystemStatusResponse;
use crate::web::server::AppState;

/// Get the overall gateway status
pub async fn get_status(data: web::Data<AppState>) -> impl Responder {
    let response = SystemStatusResponse {
        status: "running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: data.started_at.elapsed().as_secs(),
        registered_models: data.dispatcher.registry().len(),
    };

    HttpResponse::Ok().json(response)
}
