use std::sync::Arc;

use dashmap::DashMap;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::core::error::FlywheelError;
use crate::core::model::Model;
use crate::dispatch::request::ExecutionMode;
use crate::flywheel::engine::{Enhancement, FlywheelConfig, FlywheelDescription, FlywheelEngine};
use crate::models::ModelKind;

/// Declarative model registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Registry name
    pub name: String,
    /// Which built-in model to build
    pub model: ModelKind,
    /// Mode used when a caller does not choose one
    #[serde(default)]
    pub execution_mode: ExecutionMode,
    /// Flywheel settings; absent means outputs are returned raw
    #[serde(default)]
    pub flywheel: Option<FlywheelConfig>,
}

/// A model together with everything the dispatcher needs to run it.
///
/// Cloning is cheap and shares the model and its engine.
#[derive(Clone)]
pub struct RegisteredModel {
    pub name: String,
    pub model: Arc<dyn Model>,
    pub execution_mode: ExecutionMode,
    pub engine: Option<Arc<FlywheelEngine>>,
}

impl RegisteredModel {
    /// Run a raw output through this model's flywheel, if it has one.
    /// Without a flywheel the output passes through with neutral certainty.
    pub async fn enhance(&self, raw_output: Vec<f64>) -> Result<Enhancement, FlywheelError> {
        match &self.engine {
            Some(engine) => engine.enhance(raw_output).await,
            None => Ok(Enhancement::passthrough(raw_output)),
        }
    }

    pub async fn describe(&self) -> Option<FlywheelDescription> {
        match &self.engine {
            Some(engine) => Some(engine.describe().await),
            None => None,
        }
    }
}

/// Name-indexed collection of registered models.
///
/// Each model owns its flywheel engine, so memories never leak between models.
#[derive(Default)]
pub struct ModelRegistry {
    models: DashMap<String, RegisteredModel>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self {
            models: DashMap::new(),
        }
    }

    /// Register a model, replacing any model already registered under `name`.
    /// The flywheel configuration is validated before anything is stored.
    pub fn register(
        &self,
        name: &str,
        model: Arc<dyn Model>,
        execution_mode: ExecutionMode,
        flywheel: Option<FlywheelConfig>,
    ) -> Result<(), FlywheelError> {
        if name.trim().is_empty() {
            return Err(FlywheelError::Configuration(
                "model name must not be empty".to_string(),
            ));
        }

        let engine = match flywheel {
            Some(config) => Some(Arc::new(FlywheelEngine::new(config)?)),
            None => None,
        };

        if self.models.contains_key(name) {
            warn!("Replacing existing model with name: {}", name);
        }

        self.models.insert(
            name.to_string(),
            RegisteredModel {
                name: name.to_string(),
                model,
                execution_mode,
                engine,
            },
        );
        info!("Registered model: {} ({})", name, execution_mode);
        Ok(())
    }

    /// Build and register a built-in model from its spec
    pub fn register_spec(&self, spec: &ModelSpec) -> Result<(), FlywheelError> {
        let model = spec.model.build()?;
        self.register(&spec.name, model, spec.execution_mode, spec.flywheel.clone())
    }

    pub fn unregister(&self, name: &str) -> bool {
        let removed = self.models.remove(name).is_some();
        if removed {
            info!("Unregistered model: {}", name);
        } else {
            warn!("Attempted to unregister non-existent model: {}", name);
        }
        removed
    }

    /// Look up a model; the returned handle does not borrow the registry
    pub fn get(&self, name: &str) -> Option<RegisteredModel> {
        self.models.get(name).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// Registered names in sorted order
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.iter().map(|entry| entry.key().clone()).collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}
