//! Rolling tick metrics

use std::collections::VecDeque;

use serde::Serialize;

/// Number of recent ticks averaged into `rolling_avg_ms`.
pub const METRICS_WINDOW: usize = 30;

/// Timing and volume of the live-mutation feed.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub last_tick_ms: f64,
    /// Mean duration of the last [`METRICS_WINDOW`] ticks.
    pub rolling_avg_ms: f64,
    pub total_ticks: u64,
    pub total_rows_mutated: u64,
}

/// Accumulates [`PerformanceMetrics`] over a sliding window of tick durations.
#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    samples: VecDeque<f64>,
    window: usize,
    metrics: PerformanceMetrics,
}

impl MetricsRecorder {
    /// Creates a recorder averaging over `window` ticks (at least 1).
    pub fn new(window: usize) -> Self {
        let window = window.max(1);
        Self {
            samples: VecDeque::with_capacity(window),
            window,
            metrics: PerformanceMetrics::default(),
        }
    }

    /// Records one tick.
    pub fn record(&mut self, duration_ms: f64, rows_mutated: usize) {
        if self.samples.len() == self.window {
            self.samples.pop_front();
        }
        self.samples.push_back(duration_ms);

        let metrics = &mut self.metrics;
        metrics.last_tick_ms = duration_ms;
        metrics.rolling_avg_ms = self.samples.iter().sum::<f64>() / self.samples.len() as f64;
        metrics.total_ticks += 1;
        metrics.total_rows_mutated += rows_mutated as u64;
    }

    /// Returns the current metrics.
    pub fn snapshot(&self) -> PerformanceMetrics {
        self.metrics
    }

    /// Clears all samples and totals.
    pub fn reset(&mut self) {
        self.samples.clear();
        self.metrics = PerformanceMetrics::default();
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new(METRICS_WINDOW)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_average_drops_old_samples() {
        let mut recorder = MetricsRecorder::new(3);
        for ms in [10.0, 20.0, 30.0, 40.0] {
            recorder.record(ms, 5);
        }
        let m = recorder.snapshot();
        assert_eq!(m.last_tick_ms, 40.0);
        assert_eq!(m.rolling_avg_ms, 30.0);
        assert_eq!(m.total_ticks, 4);
        assert_eq!(m.total_rows_mutated, 20);

        recorder.reset();
        assert_eq!(recorder.snapshot(), PerformanceMetrics::default());
    }
}
