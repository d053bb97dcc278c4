//! Built-in models
//!
//! Small deterministic models that honour the invocation interface without an
//! ML stack behind them.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::error::FlywheelError;
use crate::core::model::{Model, ModelError};

/// Returns its input unchanged
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityModel;

impl Model for IdentityModel {
    fn compute(&self, input: &[f64]) -> Result<Vec<f64>, ModelError> {
        Ok(input.to_vec())
    }
}

/// Affine map `W·x + b`
#[derive(Debug, Clone)]
pub struct LinearModel {
    weights: Vec<Vec<f64>>,
    bias: Vec<f64>,
    input_dim: usize,
}

impl LinearModel {
    /// Build from a row-major weight matrix. A missing bias means zeros.
    pub fn new(weights: Vec<Vec<f64>>, bias: Option<Vec<f64>>) -> Result<Self, FlywheelError> {
        let input_dim = match weights.first() {
            Some(row) if !row.is_empty() => row.len(),
            _ => {
                return Err(FlywheelError::Configuration(
                    "linear model needs at least one non-empty weight row".to_string(),
                ))
            }
        };

        if let Some(row) = weights.iter().find(|row| row.len() != input_dim) {
            return Err(FlywheelError::Configuration(format!(
                "weight rows must all have {} columns, found a row with {}",
                input_dim,
                row.len()
            )));
        }

        let bias = bias.unwrap_or_else(|| vec![0.0; weights.len()]);
        if bias.len() != weights.len() {
            return Err(FlywheelError::Configuration(format!(
                "bias has {} entries but the weight matrix has {} rows",
                bias.len(),
                weights.len()
            )));
        }

        Ok(Self {
            weights,
            bias,
            input_dim,
        })
    }

    pub fn input_dim(&self) -> usize {
        self.input_dim
    }

    pub fn output_dim(&self) -> usize {
        self.weights.len()
    }
}

impl Model for LinearModel {
    fn compute(&self, input: &[f64]) -> Result<Vec<f64>, ModelError> {
        if input.len() != self.input_dim {
            return Err(ModelError::new(format!(
                "expected input of length {}, got {}",
                self.input_dim,
                input.len()
            )));
        }

        Ok(self
            .weights
            .iter()
            .zip(&self.bias)
            .map(|(row, b)| row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect())
    }
}

/// Adapts a closure to the model interface
pub struct FnModel<F> {
    compute: F,
}

impl<F> FnModel<F>
where
    F: Fn(&[f64]) -> Result<Vec<f64>, ModelError> + Send + Sync,
{
    pub fn new(compute: F) -> Self {
        Self { compute }
    }
}

impl<F> fmt::Debug for FnModel<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FnModel")
    }
}

impl<F> Model for FnModel<F>
where
    F: Fn(&[f64]) -> Result<Vec<f64>, ModelError> + Send + Sync,
{
    fn compute(&self, input: &[f64]) -> Result<Vec<f64>, ModelError> {
        (self.compute)(input)
    }
}

/// Declarative description of a built-in model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ModelKind {
    Identity,
    Linear {
        weights: Vec<Vec<f64>>,
        #[serde(default)]
        bias: Option<Vec<f64>>,
    },
}

impl ModelKind {
    pub fn build(&self) -> Result<Arc<dyn Model>, FlywheelError> {
        match self {
            ModelKind::Identity => Ok(Arc::new(IdentityModel)),
            ModelKind::Linear { weights, bias } => {
                Ok(Arc::new(LinearModel::new(weights.clone(), bias.clone())?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_model_computes_affine_map() {
        let model = LinearModel::new(
            vec![vec![1.0, 2.0], vec![0.0, -1.0], vec![0.5, 0.5]],
            Some(vec![0.0, 1.0, -1.0]),
        )
        .unwrap();

        assert_eq!(model.input_dim(), 2);
        assert_eq!(model.output_dim(), 3);
        assert_eq!(model.compute(&[2.0, 4.0]).unwrap(), vec![10.0, -3.0, 2.0]);
    }

    #[test]
    fn test_linear_model_rejects_bad_shapes() {
        assert!(LinearModel::new(vec![], None).is_err());
        assert!(LinearModel::new(vec![vec![1.0], vec![1.0, 2.0]], None).is_err());
        assert!(LinearModel::new(vec![vec![1.0]], Some(vec![0.0, 0.0])).is_err());

        let model = LinearModel::new(vec![vec![1.0, 1.0]], None).unwrap();
        assert!(model.compute(&[1.0]).is_err());
    }

    #[test]
    fn test_model_kind_from_json() {
        let kind: ModelKind = serde_json::from_str(
            r#"{"type": "linear", "weights": [[2.0]], "bias": [1.0]}"#,
        )
        .unwrap();
        let model = kind.build().unwrap();
        assert_eq!(model.compute(&[3.0]).unwrap(), vec![7.0]);

        let identity: ModelKind = serde_json::from_str(r#"{"type": "identity"}"#).unwrap();
        assert_eq!(identity.build().unwrap().compute(&[4.0, 5.0]).unwrap(), vec![4.0, 5.0]);
    }

    #[test]
    fn test_fn_model_forwards_to_closure() {
        let model = FnModel::new(|input: &[f64]| {
            if input.is_empty() {
                Err(ModelError::new("empty input"))
            } else {
                Ok(input.iter().map(|x| x * 10.0).collect())
            }
        });
        assert_eq!(model.compute(&[1.0, 2.0]).unwrap(), vec![10.0, 20.0]);
        assert_eq!(model.compute(&[]).unwrap_err().message(), "empty input");
    }
}
