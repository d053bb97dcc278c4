use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use crate::core::error::FlywheelError;
use crate::flywheel::engine::Enhancement;

/// How a model invocation is scheduled
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Run on the caller's task
    #[default]
    Sync,
    /// Run a single input on a worker thread
    Async,
    /// Run every input of a batch concurrently
    Parallel,
}

impl Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Sync => write!(f, "sync"),
            ExecutionMode::Async => write!(f, "async"),
            ExecutionMode::Parallel => write!(f, "parallel"),
        }
    }
}

/// A dispatch request.
///
/// SYNC and ASYNC carry exactly one input; PARALLEL carries a non-empty batch.
/// The shape is checked by `validate` before anything runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    pub mode: ExecutionMode,
    pub inputs: Vec<Vec<f64>>,
}

impl ExecutionRequest {
    pub fn new(mode: ExecutionMode, inputs: Vec<Vec<f64>>) -> Self {
        Self { mode, inputs }
    }

    pub fn sync(input: Vec<f64>) -> Self {
        Self::new(ExecutionMode::Sync, vec![input])
    }

    pub fn asynchronous(input: Vec<f64>) -> Self {
        Self::new(ExecutionMode::Async, vec![input])
    }

    pub fn parallel(inputs: Vec<Vec<f64>>) -> Self {
        Self::new(ExecutionMode::Parallel, inputs)
    }

    pub fn validate(&self) -> Result<(), FlywheelError> {
        match self.mode {
            ExecutionMode::Parallel if self.inputs.is_empty() => Err(FlywheelError::Configuration(
                "parallel execution requires a non-empty batch of inputs".to_string(),
            )),
            ExecutionMode::Sync | ExecutionMode::Async if self.inputs.len() != 1 => {
                Err(FlywheelError::Configuration(format!(
                    "{} execution requires exactly one input, got {}",
                    self.mode,
                    self.inputs.len()
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Enhanced outputs of a dispatch.
///
/// Every output carries the raw model value next to its enhanced form and
/// the flywheel's certainty for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DispatchOutput {
    /// Output of a SYNC or ASYNC request
    Single(Enhancement),
    /// Outputs of a PARALLEL request, in input order
    Batch(Vec<Enhancement>),
}

impl DispatchOutput {
    /// Enhanced vector of a single-input dispatch
    pub fn into_single(self) -> Option<Vec<f64>> {
        match self {
            DispatchOutput::Single(output) => Some(output.enhanced),
            DispatchOutput::Batch(_) => None,
        }
    }

    /// Enhanced vectors of a batch dispatch, in input order
    pub fn into_batch(self) -> Option<Vec<Vec<f64>>> {
        match self {
            DispatchOutput::Single(_) => None,
            DispatchOutput::Batch(outputs) => {
                Some(outputs.into_iter().map(|output| output.enhanced).collect())
            }
        }
    }

    pub fn enhancements(&self) -> &[Enhancement] {
        match self {
            DispatchOutput::Single(output) => std::slice::from_ref(output),
            DispatchOutput::Batch(outputs) => outputs,
        }
    }

    pub fn certainties(&self) -> Vec<f64> {
        self.enhancements().iter().map(|output| output.certainty).collect()
    }
}
