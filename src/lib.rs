//! Flywheel gateway
//!
//! Blends each model output with a bounded memory of that model's past
//! outputs, and dispatches model invocations synchronously, asynchronously or
//! as parallel batches.

pub mod config;
pub mod core;
pub mod dispatch;
pub mod flywheel;
pub mod models;
pub mod web;

pub use crate::core::{FlywheelError, Model, ModelError, ModelRegistry};
pub use crate::dispatch::{DispatchOutput, ExecutionDispatcher, ExecutionMode, ExecutionRequest};
pub use crate::flywheel::{FlywheelConfig, FlywheelEngine};
