use log::debug;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::core::error::FlywheelError;
use crate::flywheel::blender::{blend, NEUTRAL_CERTAINTY};
use crate::flywheel::buffer::PatternBuffer;

/// Configuration for intelligence injection via the flywheel pattern
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlywheelConfig {
    /// Stored for future adaptive behaviour; blending does not read it
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    /// Capacity of the pattern buffer
    #[serde(default = "default_memory_size")]
    pub memory_size: usize,
    /// Blend weight of memory against the raw output, in [0, 1]
    #[serde(default = "default_intelligence_factor")]
    pub intelligence_factor: f64,
    /// When false the engine is a pass-through
    #[serde(default = "default_use_memory")]
    pub use_memory: bool,
}

fn default_learning_rate() -> f64 {
    0.01
}

fn default_memory_size() -> usize {
    1000
}

fn default_intelligence_factor() -> f64 {
    0.5
}

fn default_use_memory() -> bool {
    true
}

impl Default for FlywheelConfig {
    fn default() -> Self {
        Self {
            learning_rate: default_learning_rate(),
            memory_size: default_memory_size(),
            intelligence_factor: default_intelligence_factor(),
            use_memory: default_use_memory(),
        }
    }
}

impl FlywheelConfig {
    /// Reject values the engine cannot run with. Nothing is clamped.
    pub fn validate(&self) -> Result<(), FlywheelError> {
        if self.memory_size == 0 {
            return Err(FlywheelError::Configuration(
                "memory_size must be at least 1".to_string(),
            ));
        }

        if !self.intelligence_factor.is_finite()
            || self.intelligence_factor < 0.0
            || self.intelligence_factor > 1.0
        {
            return Err(FlywheelError::Configuration(format!(
                "intelligence_factor must be between 0 and 1, got {}",
                self.intelligence_factor
            )));
        }

        if !self.learning_rate.is_finite() {
            return Err(FlywheelError::Configuration(format!(
                "learning_rate must be finite, got {}",
                self.learning_rate
            )));
        }

        Ok(())
    }
}

/// Read-only view of an engine's state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlywheelDescription {
    /// Number of patterns currently held in memory
    pub memory_depth: usize,
    /// Maximum number of patterns held in memory
    pub memory_capacity: usize,
    pub intelligence_factor: f64,
    pub learning_enabled: bool,
}

/// A raw output together with its enhanced form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enhancement {
    pub base: Vec<f64>,
    pub enhanced: Vec<f64>,
    pub certainty: f64,
}

impl Enhancement {
    /// Raw output returned as is, with neutral certainty
    pub fn passthrough(raw_output: Vec<f64>) -> Self {
        Self {
            enhanced: raw_output.clone(),
            base: raw_output,
            certainty: NEUTRAL_CERTAINTY,
        }
    }
}

/// Blends each model output with a rolling memory of that model's past outputs.
///
/// One engine is owned per registered model. The buffer sits behind a mutex so
/// concurrent PARALLEL completions record one at a time; insertion order is
/// therefore completion order.
#[derive(Debug)]
pub struct FlywheelEngine {
    config: FlywheelConfig,
    buffer: Mutex<PatternBuffer>,
}

impl FlywheelEngine {
    pub fn new(config: FlywheelConfig) -> Result<Self, FlywheelError> {
        config.validate()?;
        let buffer = PatternBuffer::new(config.memory_size);

        Ok(Self {
            config,
            buffer: Mutex::new(buffer),
        })
    }

    pub fn config(&self) -> &FlywheelConfig {
        &self.config
    }

    /// Blend `raw_output` with memory and record the raw value.
    ///
    /// History is taken before recording so the candidate never blends with
    /// itself, and only un-blended values enter memory.
    pub async fn enhance(&self, raw_output: Vec<f64>) -> Result<Enhancement, FlywheelError> {
        if !self.config.use_memory {
            return Ok(Enhancement::passthrough(raw_output));
        }

        let mut buffer = self.buffer.lock().await;
        let history = buffer.history();
        let depth = history.len();
        let result = blend(&raw_output, history, self.config.intelligence_factor)?;
        buffer.record(raw_output.clone());

        debug!(
            "Flywheel blended output against {} patterns (certainty {:.3})",
            depth, result.certainty
        );

        Ok(Enhancement {
            base: raw_output,
            enhanced: result.enhanced_output,
            certainty: result.certainty,
        })
    }

    /// Enhanced output only
    pub async fn process(&self, raw_output: Vec<f64>) -> Result<Vec<f64>, FlywheelError> {
        Ok(self.enhance(raw_output).await?.enhanced)
    }

    /// Recorded patterns, oldest first
    pub async fn snapshot(&self) -> Vec<Vec<f64>> {
        self.buffer.lock().await.snapshot()
    }

    pub async fn describe(&self) -> FlywheelDescription {
        let buffer = self.buffer.lock().await;
        FlywheelDescription {
            memory_depth: buffer.len(),
            memory_capacity: buffer.capacity(),
            intelligence_factor: self.config.intelligence_factor,
            learning_enabled: self.config.use_memory,
        }
    }
}
