//! # Metrics Recorder
//!
//! Bounded, in-memory metrics sink. Keeps a running count per event name
//! and the most recent events up to a fixed capacity; once full, the oldest
//! event is evicted for each new one. Counters are never evicted.
//!
//! Every event is also mirrored as a `tracing` event under the
//! `ethiq::metrics` target, so a subscriber can ship metrics without an
//! extra sink.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::info;

use ethiq_council::MetricsSink;

/// Default number of recent events kept.
pub const DEFAULT_METRICS_BUFFER: usize = 1000;

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEvent {
    /// Event name, e.g. `deliberation.completed`.
    pub name: String,
    /// Event payload.
    pub payload: Value,
    /// When the event was recorded.
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
struct MetricsState {
    counters: BTreeMap<String, u64>,
    recent: VecDeque<MetricEvent>,
}

/// Counter and recent-event buffer for metrics.
///
/// Cloning shares state.
#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    capacity: usize,
    state: Arc<Mutex<MetricsState>>,
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_METRICS_BUFFER)
    }
}

impl MetricsRecorder {
    /// Creates a recorder keeping up to `capacity` recent events.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            state: Arc::new(Mutex::new(MetricsState::default())),
        }
    }

    fn state(&self) -> MutexGuard<'_, MetricsState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records an event.
    pub fn record(&self, name: &str, payload: Value) {
        info!(target: "ethiq::metrics", event = name, payload = %payload);

        let mut state = self.state();
        *state.counters.entry(name.to_string()).or_default() += 1;

        if self.capacity == 0 {
            return;
        }
        while state.recent.len() >= self.capacity {
            state.recent.pop_front();
        }
        state.recent.push_back(MetricEvent {
            name: name.to_string(),
            payload,
            recorded_at: Utc::now(),
        });
    }

    /// Times `name` has been recorded.
    pub fn count(&self, name: &str) -> u64 {
        self.state().counters.get(name).copied().unwrap_or(0)
    }

    /// Every counter.
    pub fn counters(&self) -> BTreeMap<String, u64> {
        self.state().counters.clone()
    }

    /// Recent events, oldest first.
    pub fn recent(&self) -> Vec<MetricEvent> {
        self.state().recent.iter().cloned().collect()
    }

    /// Number of buffered events.
    pub fn buffered(&self) -> usize {
        self.state().recent.len()
    }

    /// Maximum number of buffered events.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Buffer fill ratio in `[0, 1]`.
    pub fn utilization(&self) -> f64 {
        if self.capacity == 0 {
            0.0
        } else {
            self.buffered() as f64 / self.capacity as f64
        }
    }

    /// Drains the buffer, keeping counters. Returns the drained events.
    pub fn drain(&self) -> Vec<MetricEvent> {
        self.state().recent.drain(..).collect()
    }
}

#[async_trait]
impl MetricsSink for MetricsRecorder {
    fn name(&self) -> &str {
        "metrics_recorder"
    }

    async fn emit(&self, event: &str, payload: Value) -> ethiq_council::Result<()> {
        self.record(event, payload);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_counts_and_buffers() {
        let recorder = MetricsRecorder::new(10);
        recorder.record("deliberation.completed", json!({"decision": "ALLOW"}));
        recorder.record("analyzer.failed", json!({"analyzer": "a"}));
        recorder.record("deliberation.completed", json!({"decision": "REMOVE"}));

        assert_eq!(recorder.count("deliberation.completed"), 2);
        assert_eq!(recorder.count("analyzer.failed"), 1);
        assert_eq!(recorder.count("unknown"), 0);
        assert_eq!(recorder.buffered(), 3);
        assert_eq!(recorder.recent()[2].payload["decision"], "REMOVE");
    }

    #[test]
    fn test_oldest_evicted_first() {
        let recorder = MetricsRecorder::new(2);
        for i in 0..5 {
            recorder.record("tick", json!({ "i": i }));
        }

        let recent = recorder.recent();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].payload["i"], 3);
        assert_eq!(recent[1].payload["i"], 4);
        assert_eq!(recorder.count("tick"), 5);
        assert!((recorder.utilization() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_zero_capacity_keeps_counters() {
        let recorder = MetricsRecorder::new(0);
        recorder.record("tick", json!(null));
        assert_eq!(recorder.buffered(), 0);
        assert_eq!(recorder.count("tick"), 1);
        assert_eq!(recorder.utilization(), 0.0);
    }

    #[test]
    fn test_drain_keeps_counters() {
        let recorder = MetricsRecorder::default();
        recorder.record("tick", json!(1));
        assert_eq!(recorder.drain().len(), 1);
        assert_eq!(recorder.buffered(), 0);
        assert_eq!(recorder.counters()["tick"], 1);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let recorder = MetricsRecorder::new(5);
        let handle = recorder.clone();
        handle.emit("x", json!({})).await.unwrap();
        assert_eq!(recorder.count("x"), 1);
    }
}
