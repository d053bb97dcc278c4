use thiserror::Error;

/// Failure raised by a model while computing an output
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct ModelError {
    message: String,
}

impl ModelError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Invocation interface every registered model implements.
///
/// A model maps one input vector to one output vector of a model-defined,
/// fixed dimensionality. How the output is produced (a network, a lookup
/// table, a remote call) is opaque to the dispatcher. Implementations are
/// called from blocking worker threads in ASYNC and PARALLEL modes and must
/// not rely on mutable shared state between calls.
#[cfg_attr(test, mockall::automock)]
pub trait Model: Send + Sync {
    /// Compute the output for a single input
    fn compute(&self, input: &[f64]) -> Result<Vec<f64>, ModelError>;
}
