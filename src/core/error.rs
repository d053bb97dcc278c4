use std::fmt::{self, Display};
use std::time::Duration;

use thiserror::Error;

use crate::core::model::ModelError;

/// Where in a request an invocation failure happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputLocation {
    /// SYNC and ASYNC requests carry a single input
    Single,
    /// Position of the failing input within a PARALLEL batch
    Batch(usize),
    /// A batch input whose worker was torn down before reporting its position
    Unattributed,
}

impl Display for InputLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputLocation::Single => Ok(()),
            InputLocation::Batch(index) => write!(f, " at input {}", index),
            InputLocation::Unattributed => write!(f, " in batch"),
        }
    }
}

/// Error type for flywheel and dispatch operations
#[derive(Debug, Error)]
pub enum FlywheelError {
    /// Invalid flywheel configuration or request shape
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// No model registered under the requested name
    #[error("Model not found: {0}")]
    ModelNotFound(String),
    /// The underlying model failed while computing
    #[error("Invocation error in model '{model}'{location}: {source}")]
    Invocation {
        model: String,
        location: InputLocation,
        #[source]
        source: ModelError,
    },
    /// A vector did not have the dimensionality of the rest of the memory
    #[error("Dimensionality error: expected {expected} components, found {found}")]
    Dimensionality { expected: usize, found: usize },
    /// The configured dispatch deadline elapsed
    #[error("Dispatch to model '{model}' timed out after {after:?}")]
    Timeout { model: String, after: Duration },
    /// A worker task panicked or was torn down by the runtime
    #[error("Worker for model '{model}'{location} failed: {reason}")]
    Worker {
        model: String,
        location: InputLocation,
        reason: String,
    },
}

impl FlywheelError {
    pub fn invocation(model: &str, location: InputLocation, source: ModelError) -> Self {
        FlywheelError::Invocation {
            model: model.to_string(),
            location,
            source,
        }
    }

    pub fn worker(model: &str, location: InputLocation, reason: impl Into<String>) -> Self {
        FlywheelError::Worker {
            model: model.to_string(),
            location,
            reason: reason.into(),
        }
    }

    /// Stable machine-readable code used in API error responses
    pub fn error_code(&self) -> &'static str {
        match self {
            FlywheelError::Configuration(_) => "CONFIGURATION_ERROR",
            FlywheelError::ModelNotFound(_) => "MODEL_NOT_FOUND",
            FlywheelError::Invocation { .. } => "INVOCATION_FAILED",
            FlywheelError::Dimensionality { .. } => "DIMENSION_MISMATCH",
            FlywheelError::Timeout { .. } => "DISPATCH_TIMEOUT",
            FlywheelError::Worker { .. } => "WORKER_FAILED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invocation_message_names_batch_index() {
        let err = FlywheelError::invocation("scorer", InputLocation::Batch(2), ModelError::new("boom"));
        assert_eq!(err.to_string(), "Invocation error in model 'scorer' at input 2: boom");

        let err = FlywheelError::invocation("scorer", InputLocation::Single, ModelError::new("boom"));
        assert_eq!(err.to_string(), "Invocation error in model 'scorer': boom");
        assert_eq!(err.error_code(), "INVOCATION_FAILED");
    }

    #[test]
    fn test_worker_message_names_batch_index() {
        let err = FlywheelError::worker("scorer", InputLocation::Batch(1), "panicked: bad row");
        assert_eq!(err.to_string(), "Worker for model 'scorer' at input 1 failed: panicked: bad row");
        assert_eq!(err.error_code(), "WORKER_FAILED");
    }
}
