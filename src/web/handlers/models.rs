use actix_web::{web, HttpResponse, Responder};
use log::{error, info};
use serde_json::json;

use crate::core::error::FlywheelError;
use crate::core::registry::ModelSpec;
use crate::dispatch::request::ExecutionRequest;
use crate::web::models::{DispatchRequest, ErrorResponse, GenericResponse, ModelInfoResponse};
use crate::web::server::AppState;

/// List every registered model with its flywheel state
pub async fn list_models(data: web::Data<AppState>) -> impl Responder {
    let registry = data.dispatcher.registry();

    let mut models = Vec::new();
    for name in registry.names() {
        // A model may be unregistered between listing and lookup
        if let Some(entry) = registry.get(&name) {
            models.push(ModelInfoResponse {
                name: entry.name.clone(),
                execution_mode: entry.execution_mode,
                flywheel: entry.describe().await,
            });
        }
    }

    HttpResponse::Ok().json(GenericResponse {
        success: true,
        message: format!("{} model(s) registered", models.len()),
        data: Some(json!({ "models": models })),
    })
}

/// Register a model from its spec
pub async fn create_model(
    data: web::Data<AppState>,
    spec: web::Json<ModelSpec>,
) -> impl Responder {
    let spec = spec.into_inner();

    match data.dispatcher.registry().register_spec(&spec) {
        Ok(()) => {
            info!("Created model {} via API", spec.name);
            HttpResponse::Created().json(GenericResponse {
                success: true,
                message: format!("Model {} registered", spec.name),
                data: Some(json!({
                    "name": spec.name,
                    "execution_mode": spec.execution_mode,
                })),
            })
        }
        Err(e) => {
            error!("Failed to create model {}: {}", spec.name, e);
            ErrorResponse::from_error(&e)
        }
    }
}

/// Get model info
pub async fn get_model(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let name = path.into_inner();

    match data.dispatcher.registry().get(&name) {
        Some(entry) => HttpResponse::Ok().json(ModelInfoResponse {
            name: entry.name.clone(),
            execution_mode: entry.execution_mode,
            flywheel: entry.describe().await,
        }),
        None => ErrorResponse::from_error(&FlywheelError::ModelNotFound(name)),
    }
}

/// Unregister a model
pub async fn delete_model(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let name = path.into_inner();

    if data.dispatcher.unregister(&name) {
        HttpResponse::Ok().json(GenericResponse {
            success: true,
            message: format!("Model {} removed", name),
            data: None,
        })
    } else {
        ErrorResponse::from_error(&FlywheelError::ModelNotFound(name))
    }
}

/// Run a model on one input or a batch. Each output reports its raw value,
/// enhanced value and certainty.
pub async fn dispatch(
    data: web::Data<AppState>,
    path: web::Path<String>,
    request: web::Json<DispatchRequest>,
) -> impl Responder {
    let name = path.into_inner();
    let request = request.into_inner();

    let result = match request.mode {
        Some(mode) => {
            data.dispatcher
                .dispatch(&name, ExecutionRequest::new(mode, request.inputs))
                .await
        }
        None => data.dispatcher.predict(&name, request.inputs).await,
    };

    match result {
        Ok(output) => HttpResponse::Ok().json(GenericResponse {
            success: true,
            message: "Dispatch completed".to_string(),
            data: Some(json!({ "output": output })),
        }),
        Err(e) => ErrorResponse::from_error(&e),
    }
}

/// Get dispatch statistics for a model
pub async fn get_stats(data: web::Data<AppState>, path: web::Path<String>) -> impl Responder {
    let name = path.into_inner();

    if !data.dispatcher.registry().contains(&name) {
        return ErrorResponse::from_error(&FlywheelError::ModelNotFound(name));
    }

    HttpResponse::Ok().json(GenericResponse {
        success: true,
        message: format!("Statistics for {}", name),
        data: Some(json!({ "stats": data.dispatcher.metrics().get(&name) })),
    })
}
