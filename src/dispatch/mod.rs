//! Execution dispatch
//!
//! Schedules model invocations synchronously, on a worker, or as a concurrent
//! batch, and runs every individual output through the model's flywheel.

pub mod dispatcher;
pub mod request;

pub use dispatcher::{DispatcherConfig, ExecutionDispatcher};
pub use request::{DispatchOutput, ExecutionMode, ExecutionRequest};
