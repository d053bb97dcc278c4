//! Core types shared by the flywheel and the dispatcher

pub mod error;
pub mod metrics;
pub mod model;
pub mod registry;

pub use error::{FlywheelError, InputLocation};
pub use model::{Model, ModelError};
pub use registry::{ModelRegistry, ModelSpec, RegisteredModel};
