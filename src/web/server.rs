use std::sync::Arc;
use std::time::Instant;

use actix_web::{middleware, web, App, HttpServer};
use log::info;

use crate::config::ServerConfig;
use crate::dispatch::dispatcher::ExecutionDispatcher;
use crate::web::handlers;

/// Start the gateway HTTP server
pub async fn start_web_server(
    dispatcher: Arc<ExecutionDispatcher>,
    server: &ServerConfig,
) -> std::io::Result<()> {
    info!("Starting web server on http://{}:{}", server.host, server.port);

    // Create shared application state
    let app_state = web::Data::new(AppState::new(dispatcher));

    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(app_state.clone())
            .configure(configure_routes)
    })
    .bind((server.host.as_str(), server.port))?
    .run()
    .await
}

/// API routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // System APIs
            .route("/system/status", web::get().to(handlers::system::get_status))
            // Model APIs
            .route("/models", web::get().to(handlers::models::list_models))
            .route("/models", web::post().to(handlers::models::create_model))
            .route("/models/{name}", web::get().to(handlers::models::get_model))
            .route("/models/{name}", web::delete().to(handlers::models::delete_model))
            .route("/models/{name}/dispatch", web::post().to(handlers::models::dispatch))
            .route("/models/{name}/stats", web::get().to(handlers::models::get_stats)),
    );
}

/// Shared application state for web handlers
pub struct AppState {
    pub dispatcher: Arc<ExecutionDispatcher>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(dispatcher: Arc<ExecutionDispatcher>) -> Self {
        Self {
            dispatcher,
            started_at: Instant::now(),
        }
    }
}
