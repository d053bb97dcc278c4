//! Flywheel memory engine
//!
//! Bounded pattern memory and similarity blending that nudge a model's raw
//! output toward consistency with its own recent history.

pub mod buffer;
pub mod blender;
pub mod engine;

pub use blender::{blend, BlendResult};
pub use buffer::PatternBuffer;
pub use engine::{Enhancement, FlywheelConfig, FlywheelDescription, FlywheelEngine};
