use chrono::{DateTime, Utc};
use dashmap::DashMap;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::dispatch::request::ExecutionMode;

/// Dispatch statistics for a single model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelMetrics {
    /// Number of successful dispatches
    pub dispatches: u64,
    /// Number of failed dispatches
    pub failures: u64,
    /// Average dispatch time in ms, over successes and failures
    pub avg_dispatch_ms: f64,
    /// Duration of the most recent dispatch in ms
    pub last_dispatch_ms: f64,
    /// Mode of the most recent dispatch
    pub last_mode: ExecutionMode,
    /// Last updated timestamp
    pub last_updated: DateTime<Utc>,
}

/// Collects per-model dispatch statistics
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    per_model: DashMap<String, ModelMetrics>,
}

impl DispatchMetrics {
    pub fn new() -> Self {
        Self {
            per_model: DashMap::new(),
        }
    }

    /// Record one finished dispatch
    pub fn record(&self, model: &str, mode: ExecutionMode, success: bool, elapsed_ms: f64) {
        let mut metrics = self
            .per_model
            .entry(model.to_string())
            .or_insert_with(|| ModelMetrics {
                dispatches: 0,
                failures: 0,
                avg_dispatch_ms: 0.0,
                last_dispatch_ms: 0.0,
                last_mode: mode,
                last_updated: Utc::now(),
            });

        if success {
            metrics.dispatches += 1;
        } else {
            metrics.failures += 1;
        }

        // Running average over every recorded dispatch
        let total = metrics.dispatches + metrics.failures;
        if total > 1 {
            metrics.avg_dispatch_ms =
                (metrics.avg_dispatch_ms * (total - 1) as f64 + elapsed_ms) / total as f64;
        } else {
            metrics.avg_dispatch_ms = elapsed_ms;
        }

        metrics.last_dispatch_ms = elapsed_ms;
        metrics.last_mode = mode;
        metrics.last_updated = Utc::now();

        debug!(
            "Recorded {} dispatch for {} in {:.2}ms",
            if success { "successful" } else { "failed" },
            model,
            elapsed_ms
        );
    }

    pub fn get(&self, model: &str) -> Option<ModelMetrics> {
        self.per_model.get(model).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, model: &str) {
        self.per_model.remove(model);
    }
}

/// Helper function to measure execution time
pub async fn measure_execution_time<F, T, E>(f: F) -> (Result<T, E>, f64)
where
    F: std::future::Future<Output = Result<T, E>>,
{
    let start = std::time::Instant::now();
    let result = f.await;
    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

    (result, duration_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_tracks_counts_and_average() {
        let metrics = DispatchMetrics::new();
        assert!(metrics.get("scorer").is_none());

        metrics.record("scorer", ExecutionMode::Sync, true, 10.0);
        metrics.record("scorer", ExecutionMode::Parallel, false, 20.0);
        metrics.record("scorer", ExecutionMode::Async, true, 30.0);

        let snapshot = metrics.get("scorer").unwrap();
        assert_eq!(snapshot.dispatches, 2);
        assert_eq!(snapshot.failures, 1);
        assert!((snapshot.avg_dispatch_ms - 20.0).abs() < 1e-9);
        assert_eq!(snapshot.last_dispatch_ms, 30.0);
        assert_eq!(snapshot.last_mode, ExecutionMode::Async);

        metrics.remove("scorer");
        assert!(metrics.get("scorer").is_none());
    }

    #[tokio::test]
    async fn test_measure_execution_time_passes_result_through() {
        let (result, elapsed) = measure_execution_time(async { Ok::<_, String>(7) }).await;
        assert_eq!(result.unwrap(), 7);
        assert!(elapsed >= 0.0);
    }
}
