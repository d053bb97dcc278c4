use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::task::JoinSet;
use uuid::Uuid;

use crate::core::error::{FlywheelError, InputLocation};
use crate::core::metrics::{measure_execution_time, DispatchMetrics};
use crate::core::model::{Model, ModelError};
use crate::core::registry::{ModelRegistry, RegisteredModel};
use crate::dispatch::request::{DispatchOutput, ExecutionMode, ExecutionRequest};
use crate::flywheel::engine::{Enhancement, FlywheelDescription};

/// Dispatcher settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// Deadline for ASYNC and PARALLEL waits; none means wait forever
    #[serde(default)]
    pub timeout_ms: Option<u64>,
}

impl DispatcherConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}

/// Outcome of one blocking invocation: the model's own result, or the panic
/// message if the model panicked
type Computed = Result<Result<Vec<f64>, ModelError>, String>;

type WorkerOutput = (usize, Computed);

/// Decides how a registered model is invoked.
///
/// SYNC runs the model on the calling task. ASYNC and PARALLEL hand each
/// invocation to tokio's blocking pool and apply the flywheel on the
/// dispatching task as each worker completes, so a dropped or timed-out wait
/// never reaches the model's memory.
///
/// PARALLEL is fail-fast: the first failure is returned and the remaining
/// workers are aborted. Abort is best effort; a worker already running keeps
/// running in the background and its output is discarded.
pub struct ExecutionDispatcher {
    registry: Arc<ModelRegistry>,
    metrics: Arc<DispatchMetrics>,
    config: DispatcherConfig,
}

impl ExecutionDispatcher {
    pub fn new(registry: Arc<ModelRegistry>, config: DispatcherConfig) -> Self {
        info!(
            "Execution dispatcher ready (timeout: {:?})",
            config.timeout()
        );
        Self {
            registry,
            metrics: Arc::new(DispatchMetrics::new()),
            config,
        }
    }

    pub fn registry(&self) -> &Arc<ModelRegistry> {
        &self.registry
    }

    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    pub fn config(&self) -> &DispatcherConfig {
        &self.config
    }

    /// Run `request` against the model registered as `model_name`.
    ///
    /// Lookup and request shape are checked before any invocation is scheduled.
    pub async fn dispatch(
        &self,
        model_name: &str,
        request: ExecutionRequest,
    ) -> Result<DispatchOutput, FlywheelError> {
        let entry = self
            .registry
            .get(model_name)
            .ok_or_else(|| FlywheelError::ModelNotFound(model_name.to_string()))?;
        request.validate()?;

        let dispatch_id = Uuid::new_v4();
        let mode = request.mode;
        debug!(
            "Dispatch {} to {}: {} mode, {} input(s)",
            dispatch_id,
            model_name,
            mode,
            request.inputs.len()
        );

        let (result, elapsed_ms) = measure_execution_time(self.run(&entry, request)).await;
        self.metrics.record(model_name, mode, result.is_ok(), elapsed_ms);
        // The model may have been unregistered while this dispatch was running
        if !self.registry.contains(model_name) {
            self.metrics.remove(model_name);
        }

        match &result {
            Ok(_) => debug!("Dispatch {} completed in {:.2}ms", dispatch_id, elapsed_ms),
            Err(e) => error!("Dispatch {} to {} failed: {}", dispatch_id, model_name, e),
        }

        result
    }

    /// Dispatch using the model's registered execution mode
    pub async fn predict(
        &self,
        model_name: &str,
        inputs: Vec<Vec<f64>>,
    ) -> Result<DispatchOutput, FlywheelError> {
        let mode = self
            .registry
            .get(model_name)
            .map(|entry| entry.execution_mode)
            .ok_or_else(|| FlywheelError::ModelNotFound(model_name.to_string()))?;

        self.dispatch(model_name, ExecutionRequest::new(mode, inputs)).await
    }

    /// Flywheel state of a model, or `None` when the model is unknown or has no flywheel
    pub async fn describe(&self, model_name: &str) -> Option<FlywheelDescription> {
        match self.registry.get(model_name) {
            Some(entry) => entry.describe().await,
            None => None,
        }
    }

    /// Remove a model along with its statistics
    pub fn unregister(&self, model_name: &str) -> bool {
        let removed = self.registry.unregister(model_name);
        if removed {
            self.metrics.remove(model_name);
        }
        removed
    }

    async fn run(
        &self,
        entry: &RegisteredModel,
        request: ExecutionRequest,
    ) -> Result<DispatchOutput, FlywheelError> {
        let ExecutionRequest { mode, inputs } = request;

        match mode {
            ExecutionMode::Sync => {
                let input = single_input(inputs)?;
                self.run_sync(entry, input).await.map(DispatchOutput::Single)
            }
            ExecutionMode::Async => {
                let input = single_input(inputs)?;
                self.run_async(entry, input).await.map(DispatchOutput::Single)
            }
            ExecutionMode::Parallel => self.run_parallel(entry, inputs).await.map(DispatchOutput::Batch),
        }
    }

    async fn run_sync(
        &self,
        entry: &RegisteredModel,
        input: Vec<f64>,
    ) -> Result<Enhancement, FlywheelError> {
        let raw = entry
            .model
            .compute(&input)
            .map_err(|e| FlywheelError::invocation(&entry.name, InputLocation::Single, e))?;

        entry.enhance(raw).await
    }

    async fn run_async(
        &self,
        entry: &RegisteredModel,
        input: Vec<f64>,
    ) -> Result<Enhancement, FlywheelError> {
        let model = Arc::clone(&entry.model);
        let worker = tokio::task::spawn_blocking(move || guarded_compute(model.as_ref(), &input));

        let joined = match self.config.timeout() {
            Some(limit) => match tokio::time::timeout(limit, worker).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!("Async invocation of {} timed out after {:?}", entry.name, limit);
                    return Err(FlywheelError::Timeout {
                        model: entry.name.clone(),
                        after: limit,
                    });
                }
            },
            None => worker.await,
        };

        let raw = joined
            .map_err(|e| FlywheelError::worker(&entry.name, InputLocation::Single, e.to_string()))?
            .map_err(|reason| FlywheelError::worker(&entry.name, InputLocation::Single, reason))?
            .map_err(|e| FlywheelError::invocation(&entry.name, InputLocation::Single, e))?;

        entry.enhance(raw).await
    }

    async fn run_parallel(
        &self,
        entry: &RegisteredModel,
        inputs: Vec<Vec<f64>>,
    ) -> Result<Vec<Enhancement>, FlywheelError> {
        let total = inputs.len();
        let mut workers: JoinSet<WorkerOutput> = JoinSet::new();
        for (index, input) in inputs.into_iter().enumerate() {
            let model = Arc::clone(&entry.model);
            workers.spawn_blocking(move || (index, guarded_compute(model.as_ref(), &input)));
        }

        let mut outputs: Vec<Option<Enhancement>> = vec![None; total];
        let collected = match self.config.timeout() {
            Some(limit) => {
                match tokio::time::timeout(limit, collect_batch(entry, &mut workers, &mut outputs)).await {
                    Ok(result) => result,
                    Err(_) => Err(FlywheelError::Timeout {
                        model: entry.name.clone(),
                        after: limit,
                    }),
                }
            }
            None => collect_batch(entry, &mut workers, &mut outputs).await,
        };

        if let Err(e) = collected {
            if !workers.is_empty() {
                warn!(
                    "Cancelling {} in-flight invocation(s) of {} after failure",
                    workers.len(),
                    entry.name
                );
            }
            workers.abort_all();
            return Err(e);
        }

        outputs
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| {
                FlywheelError::worker(
                    &entry.name,
                    InputLocation::Unattributed,
                    "batch finished with missing outputs",
                )
            })
    }
}

/// Drain finished workers in completion order, enhancing and storing each
/// output at its input position. Stops at the first failure.
async fn collect_batch(
    entry: &RegisteredModel,
    workers: &mut JoinSet<WorkerOutput>,
    outputs: &mut [Option<Enhancement>],
) -> Result<(), FlywheelError> {
    while let Some(joined) = workers.join_next().await {
        // Panics are caught inside the worker, so a join error here means
        // the runtime dropped the task
        let (index, computed) = joined.map_err(|e| {
            FlywheelError::worker(&entry.name, InputLocation::Unattributed, e.to_string())
        })?;
        let location = InputLocation::Batch(index);
        let raw = computed
            .map_err(|reason| FlywheelError::worker(&entry.name, location, reason))?
            .map_err(|e| FlywheelError::invocation(&entry.name, location, e))?;

        outputs[index] = Some(entry.enhance(raw).await?);
    }

    Ok(())
}

/// Invoke `model`, catching a panic so the caller can report which input
/// caused it
fn guarded_compute(model: &dyn Model, input: &[f64]) -> Computed {
    panic::catch_unwind(AssertUnwindSafe(|| model.compute(input))).map_err(panic_reason)
}

fn panic_reason(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {}", message)
    } else {
        "panicked".to_string()
    }
}

fn single_input(inputs: Vec<Vec<f64>>) -> Result<Vec<f64>, FlywheelError> {
    inputs.into_iter().next().ok_or_else(|| {
        FlywheelError::Configuration("request carries no input".to_string())
    })
}
