//! Similarity-weighted blending of a candidate output against memory.
//!
//! Similarity between two vectors is `1 / (1 + d)` where `d` is their
//! Euclidean distance, so scores stay in `(0, 1]` and identical vectors score
//! exactly 1. The blend pulls the candidate toward the similarity-weighted
//! centroid of the history by `factor`.

use serde::{Deserialize, Serialize};

use crate::core::error::FlywheelError;

/// Number of most recent history entries consulted for certainty
pub const CERTAINTY_WINDOW: usize = 5;

/// Certainty reported when there is no history to compare against
pub const NEUTRAL_CERTAINTY: f64 = 0.5;

/// Outcome of blending a single candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlendResult {
    /// Candidate nudged toward memory, same shape as the candidate
    pub enhanced_output: Vec<f64>,
    /// Mean similarity of the candidate to recent memory, in [0, 1]
    pub certainty: f64,
}

/// Euclidean distance between two vectors of equal length.
///
/// Components are scaled by the largest absolute difference before squaring,
/// so large finite vectors do not overflow to infinity.
pub fn distance(a: &[f64], b: &[f64]) -> f64 {
    let scale = a
        .iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0_f64, f64::max);

    if scale == 0.0 || !scale.is_finite() {
        return scale;
    }

    let scaled: f64 = a
        .iter()
        .zip(b)
        .map(|(x, y)| {
            let d = (x - y) / scale;
            d * d
        })
        .sum();

    scale * scaled.sqrt()
}

/// Bounded similarity score in (0, 1]
pub fn similarity(a: &[f64], b: &[f64]) -> f64 {
    1.0 / (1.0 + distance(a, b))
}

/// Blend `candidate` with `history` (oldest first) using weight `factor`.
///
/// With an empty history the candidate is returned untouched with a neutral
/// certainty. Every history vector must match the candidate's length.
pub fn blend(
    candidate: &[f64],
    history: &[Vec<f64>],
    factor: f64,
) -> Result<BlendResult, FlywheelError> {
    if history.is_empty() {
        return Ok(BlendResult {
            enhanced_output: candidate.to_vec(),
            certainty: NEUTRAL_CERTAINTY,
        });
    }

    let dim = candidate.len();
    if let Some(mismatch) = history.iter().find(|h| h.len() != dim) {
        return Err(FlywheelError::Dimensionality {
            expected: dim,
            found: mismatch.len(),
        });
    }

    let similarities: Vec<f64> = history.iter().map(|h| similarity(h, candidate)).collect();
    let total: f64 = similarities.iter().sum();
    // Every pattern infinitely far away: fall back to a plain mean
    let uniform = total == 0.0 || !total.is_finite();

    let mut centroid = vec![0.0; dim];
    for (pattern, score) in history.iter().zip(&similarities) {
        let weight = if uniform {
            1.0 / history.len() as f64
        } else {
            score / total
        };
        for (acc, value) in centroid.iter_mut().zip(pattern) {
            *acc += weight * value;
        }
    }

    let enhanced_output = candidate
        .iter()
        .zip(&centroid)
        .map(|(c, h)| (1.0 - factor) * c + factor * h)
        .collect();

    let recent = &similarities[similarities.len().saturating_sub(CERTAINTY_WINDOW)..];
    let certainty = recent.iter().sum::<f64>() / recent.len() as f64;

    Ok(BlendResult {
        enhanced_output,
        certainty,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{} != {}", a, b);
    }

    #[test]
    fn test_empty_history_is_passthrough() {
        for factor in [0.0, 0.3, 1.0] {
            let result = blend(&[1.5, -2.0, 7.0], &[], factor).unwrap();
            assert_eq!(result.enhanced_output, vec![1.5, -2.0, 7.0]);
            assert_eq!(result.certainty, NEUTRAL_CERTAINTY);
        }
    }

    #[test]
    fn test_self_similarity_is_maximal() {
        let vector = vec![0.25, 4.0];
        let result = blend(&vector, &[vector.clone()], 0.7).unwrap();
        assert_close(result.certainty, 1.0);
        assert_close(result.enhanced_output[0], 0.25);
        assert_close(result.enhanced_output[1], 4.0);
    }

    #[test]
    fn test_closer_history_dominates_centroid() {
        let history = vec![vec![1.0, 1.0], vec![3.0, 3.0]];
        let candidate = [5.0, 5.0];
        let result = blend(&candidate, &history, 0.5).unwrap();

        let s_far = similarity(&history[0], &candidate);
        let s_near = similarity(&history[1], &candidate);
        assert!(s_near > s_far);

        let centroid = (1.0 * s_far + 3.0 * s_near) / (s_far + s_near);
        assert!(centroid > 2.0, "centroid should lean toward [3, 3]");

        for value in &result.enhanced_output {
            assert!(*value > centroid && *value < 5.0);
            assert_close(*value, 0.5 * 5.0 + 0.5 * centroid);
        }
        assert_close(result.certainty, (s_far + s_near) / 2.0);
    }

    #[test]
    fn test_factor_bounds() {
        let history = vec![vec![0.0], vec![10.0]];
        let untouched = blend(&[4.0], &history, 0.0).unwrap();
        assert_close(untouched.enhanced_output[0], 4.0);

        let centroid_only = blend(&[4.0], &history, 1.0).unwrap();
        let s0 = similarity(&[0.0], &[4.0]);
        let s1 = similarity(&[10.0], &[4.0]);
        assert_close(centroid_only.enhanced_output[0], 10.0 * s1 / (s0 + s1));
    }

    #[test]
    fn test_certainty_uses_recent_window() {
        // Old entries are far away, the last five match the candidate exactly
        let mut history = vec![vec![100.0]; 10];
        history.extend(vec![vec![1.0]; CERTAINTY_WINDOW]);
        let result = blend(&[1.0], &history, 0.5).unwrap();
        assert_close(result.certainty, 1.0);
    }

    #[test]
    fn test_large_magnitudes_stay_finite() {
        assert_close(distance(&[3e200, 0.0], &[0.0, 4e200]) / 5e200, 1.0);

        let result = blend(&[-1e160, 0.0], &[vec![1e160, 0.0]], 0.5).unwrap();
        assert!(result.enhanced_output.iter().all(|v| v.is_finite()));
        assert!(result.certainty.is_finite());
        assert_close(result.enhanced_output[0], 0.0);

        // Differences overflow, so every similarity is zero
        let history = vec![vec![f64::MAX], vec![f64::MAX / 2.0]];
        let result = blend(&[-f64::MAX], &history, 0.5).unwrap();
        assert!(result.enhanced_output.iter().all(|v| v.is_finite()));
        assert_eq!(result.certainty, 0.0);
    }

    #[test]
    fn test_dimension_mismatch_fails_fast() {
        let history = vec![vec![1.0, 2.0], vec![1.0, 2.0, 3.0]];
        match blend(&[1.0, 2.0], &history, 0.5) {
            Err(FlywheelError::Dimensionality { expected, found }) => {
                assert_eq!(expected, 2);
                assert_eq!(found, 3);
            }
            other => panic!("expected dimensionality error, got {:?}", other),
        }
    }
}
