//! The `Collector` seam and its null and prefixing implementations.

use super::MetricValue;
use crate::units::Unit;
use std::sync::Arc;

/// Receives metric updates.
///
/// Implementations decide what a metric name means and where values go.
#[cfg_attr(test, mockall::automock)]
pub trait Collector: Send + Sync {
    /// Increments the counter `metric` by `value`.
    fn incr(&self, metric: &str, value: MetricValue, unit: Unit);

    /// Sets the gauge `metric` to `value`.
    fn set(&self, metric: &str, value: MetricValue, unit: Unit);
}

/// A collector that discards every update.
///
/// Used as the default when no collector is set on a context.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCollector;

impl Collector for NullCollector {
    fn incr(&self, _metric: &str, _value: MetricValue, _unit: Unit) {}

    fn set(&self, _metric: &str, _value: MetricValue, _unit: Unit) {}
}

/// A collector that prepends `/name` to every metric before forwarding.
///
/// Nested prefixes compose: `a` around `b` turns `m` into `/a/b/m`.
pub struct PrefixedCollector {
    inner: Arc<dyn Collector>,
    prefix: String,
}

impl PrefixedCollector {
    /// Wraps `inner` under the group `name`.
    #[must_use]
    pub fn new(inner: Arc<dyn Collector>, name: &str) -> Self {
        Self {
            inner,
            prefix: format!("/{name}"),
        }
    }

    /// Returns the prefix, including its leading slash.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn qualify(&self, metric: &str) -> String {
        if metric.starts_with('/') {
            format!("{}{metric}", self.prefix)
        } else {
            format!("{}/{metric}", self.prefix)
        }
    }
}

impl Collector for PrefixedCollector {
    fn incr(&self, metric: &str, value: MetricValue, unit: Unit) {
        self.inner.incr(&self.qualify(metric), value, unit);
    }

    fn set(&self, metric: &str, value: MetricValue, unit: Unit) {
        self.inner.set(&self.qualify(metric), value, unit);
    }
}

impl std::fmt::Debug for PrefixedCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrefixedCollector")
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}
