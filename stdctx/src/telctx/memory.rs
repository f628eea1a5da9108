//! In-process metrics storage.
//!
//! Keeps counters and gauges in memory so tests and small services can read
//! them back. Nothing is exported anywhere.

use super::{Collector, MetricValue};
use crate::units::{fmt_f64, Unit};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

/// The current state of one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEntry {
    /// Current value.
    pub value: MetricValue,
    /// Unit from the most recent update.
    pub unit: Unit,
    /// Number of updates applied.
    pub updates: u64,
}

impl MetricEntry {
    fn new(value: MetricValue, unit: Unit) -> Self {
        Self {
            value,
            unit,
            updates: 1,
        }
    }

    /// Formats the value with SI prefix and unit symbol (`"1.50kB"`).
    #[must_use]
    pub fn formatted(&self) -> String {
        match self.value.as_f64() {
            Some(x) => fmt_f64(x, &self.unit),
            None => self.value.to_string(),
        }
    }
}

/// Point-in-time copy of every metric, sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Counters, updated by `incr`.
    pub counters: BTreeMap<String, MetricEntry>,
    /// Gauges, updated by `set`.
    pub gauges: BTreeMap<String, MetricEntry>,
}

impl MetricsSnapshot {
    /// Returns true if no metric has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty() && self.gauges.is_empty()
    }
}

/// A collector that keeps counters and gauges in memory.
#[derive(Debug, Default)]
pub struct MemoryCollector {
    counters: DashMap<String, MetricEntry>,
    gauges: DashMap<String, MetricEntry>,
}

impl MemoryCollector {
    /// Creates an empty collector.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a counter's value.
    #[must_use]
    pub fn counter(&self, metric: &str) -> Option<MetricValue> {
        self.counters.get(metric).map(|e| e.value.clone())
    }

    /// Returns a gauge's value.
    #[must_use]
    pub fn gauge(&self, metric: &str) -> Option<MetricValue> {
        self.gauges.get(metric).map(|e| e.value.clone())
    }

    /// Returns a counter's full entry.
    #[must_use]
    pub fn counter_entry(&self, metric: &str) -> Option<MetricEntry> {
        self.counters.get(metric).map(|e| e.value().clone())
    }

    /// Returns a gauge's full entry.
    #[must_use]
    pub fn gauge_entry(&self, metric: &str) -> Option<MetricEntry> {
        self.gauges.get(metric).map(|e| e.value().clone())
    }

    /// Returns the number of distinct metrics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counters.len() + self.gauges.len()
    }

    /// Returns true if nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counters.is_empty() && self.gauges.is_empty()
    }

    /// Copies every metric into a snapshot.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            counters: self
                .counters
                .iter()
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect(),
            gauges: self
                .gauges
                .iter()
                .map(|e| (e.key().clone(), e.value().clone()))
                .collect(),
        }
    }

    /// Removes every metric.
    pub fn reset(&self) {
        self.counters.clear();
        self.gauges.clear();
    }
}

impl Collector for MemoryCollector {
    fn incr(&self, metric: &str, value: MetricValue, unit: Unit) {
        if !value.is_numeric() {
            warn!(metric, %value, "Ignoring non-numeric counter increment");
            return;
        }
        match self.counters.entry(metric.to_string()) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                if let Some(sum) = entry.value.checked_add(&value) {
                    entry.value = sum;
                }
                entry.unit = unit;
                entry.updates += 1;
            }
            Entry::Vacant(vacant) => {
                vacant.insert(MetricEntry::new(value, unit));
            }
        }
    }

    fn set(&self, metric: &str, value: MetricValue, unit: Unit) {
        match self.gauges.entry(metric.to_string()) {
            Entry::Occupied(mut occupied) => {
                let entry = occupied.get_mut();
                entry.value = value;
                entry.unit = unit;
                entry.updates += 1;
            }
            Entry::Vacant(vacant) => {
                vacant.insert(MetricEntry::new(value, unit));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[test]
    fn test_initial_state() {
        let c = MemoryCollector::new();
        assert!(c.is_empty());
        assert!(c.snapshot().is_empty());
        assert!(c.counter("x").is_none());
    }

    #[test]
    fn test_incr_accumulates() {
        let c = MemoryCollector::new();
        c.incr("requests", MetricValue::Uint(1), Unit::None);
        c.incr("requests", MetricValue::Uint(2), Unit::None);
        assert_eq!(c.counter("requests"), Some(MetricValue::Uint(3)));
        assert_eq!(c.counter_entry("requests").unwrap().updates, 2);
    }

    #[test]
    fn test_incr_rejects_strings() {
        let c = MemoryCollector::new();
        c.incr("bad", MetricValue::from("nope"), Unit::None);
        assert!(c.is_empty());
    }

    #[test]
    fn test_set_overwrites() {
        let c = MemoryCollector::new();
        c.set("state", MetricValue::from("starting"), Unit::None);
        c.set("state", MetricValue::from("ready"), Unit::None);
        assert_eq!(c.gauge("state"), Some(MetricValue::from("ready")));
        assert_eq!(c.gauge_entry("state").unwrap().updates, 2);
    }

    #[test]
    fn test_counters_and_gauges_are_separate() {
        let c = MemoryCollector::new();
        c.incr("x", MetricValue::Int(1), Unit::None);
        c.set("x", MetricValue::Int(10), Unit::None);
        assert_eq!(c.counter("x"), Some(MetricValue::Int(1)));
        assert_eq!(c.gauge("x"), Some(MetricValue::Int(10)));
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn test_snapshot_serialization() {
        let c = MemoryCollector::new();
        c.incr("bytes_out", MetricValue::Uint(1500), Unit::Bytes);
        c.set("peers", MetricValue::Int(3), Unit::None);

        let snapshot = c.snapshot();
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "counters": {"bytes_out": {"value": 1500, "unit": "bytes", "updates": 1}},
                "gauges": {"peers": {"value": 3, "unit": "", "updates": 1}},
            })
        );
        let back: MetricsSnapshot = serde_json::from_value(json).unwrap();
        assert_eq!(back.counters["bytes_out"].unit, Unit::Bytes);
    }

    #[test]
    fn test_snapshot_round_trip_with_named_units() {
        let c = MemoryCollector::new();
        c.incr("jobs", MetricValue::Int(7), Unit::other("jobs"));
        c.set("ratio", MetricValue::Float(0.5), Unit::None);
        c.set("region", MetricValue::from("eu"), Unit::from("zone".to_string()));

        let snapshot = c.snapshot();
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: MetricsSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
        assert_eq!(back.counters["jobs"].unit, Unit::other("jobs"));
        assert_eq!(back.counters["jobs"].formatted(), "7jobs");
    }

    #[test]
    fn test_formatted() {
        let c = MemoryCollector::new();
        c.incr("bytes_out", MetricValue::Uint(1500), Unit::Bytes);
        c.set("mode", MetricValue::from("fast"), Unit::None);
        assert_eq!(c.counter_entry("bytes_out").unwrap().formatted(), "1.50kB");
        assert_eq!(c.gauge_entry("mode").unwrap().formatted(), "fast");
    }

    #[test]
    fn test_reset() {
        let c = MemoryCollector::new();
        c.incr("a", MetricValue::Int(1), Unit::None);
        c.reset();
        assert!(c.is_empty());
    }

    #[test]
    fn test_concurrent_increments() {
        let c = Arc::new(MemoryCollector::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = c.clone();
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        c.incr("hits", MetricValue::Uint(1), Unit::None);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(c.counter("hits"), Some(MetricValue::Uint(800)));
    }
}
