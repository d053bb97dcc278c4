use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};

use crate::core::error::FlywheelError;
use crate::dispatch::request::ExecutionMode;
use crate::flywheel::engine::FlywheelDescription;

/// System status response
#[derive(Serialize)]
pub struct SystemStatusResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub registered_models: usize,
}

/// Model info response
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelInfoResponse {
    pub name: String,
    pub execution_mode: ExecutionMode,
    /// `None` when the model has no flywheel
    pub flywheel: Option<FlywheelDescription>,
}

/// Dispatch request; without `mode` the model's registered mode is used
#[derive(Deserialize)]
pub struct DispatchRequest {
    pub mode: Option<ExecutionMode>,
    pub inputs: Vec<Vec<f64>>,
}

/// Generic response for API operations
#[derive(Serialize)]
pub struct GenericResponse {
    pub success: bool,
    pub message: String,
    pub data: Option<serde_json::Value>,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
}

impl ErrorResponse {
    /// Map a flywheel error onto an HTTP response
    pub fn from_error(err: &FlywheelError) -> HttpResponse {
        let status = match err {
            FlywheelError::Configuration(_) | FlywheelError::Dimensionality { .. } => {
                StatusCode::BAD_REQUEST
            }
            FlywheelError::ModelNotFound(_) => StatusCode::NOT_FOUND,
            FlywheelError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            FlywheelError::Invocation { .. } | FlywheelError::Worker { .. } => StatusCode::BAD_GATEWAY,
        };

        HttpResponse::build(status).json(ErrorResponse {
            success: false,
            error: err.to_string(),
            error_code: err.error_code().to_string(),
        })
    }
}
