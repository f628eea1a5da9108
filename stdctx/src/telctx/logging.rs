//! Collector that reports metric updates as `tracing` events.

use super::{Collector, MetricValue};
use crate::units::{fmt_f64, Unit};
use tracing::Level;

/// A collector that logs every update through the tracing framework.
#[derive(Debug, Clone)]
pub struct TracingCollector {
    level: Level,
}

impl Default for TracingCollector {
    fn default() -> Self {
        Self { level: Level::DEBUG }
    }
}

impl TracingCollector {
    /// Creates a tracing collector that logs at `level`.
    #[must_use]
    pub const fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level collector.
    #[must_use]
    pub const fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    /// Creates an info-level collector.
    #[must_use]
    pub const fn info() -> Self {
        Self::new(Level::INFO)
    }

    /// Returns the level updates are logged at.
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }

    fn record(&self, op: &'static str, metric: &str, value: &MetricValue, unit: &Unit) {
        let shown = value
            .as_f64()
            .map_or_else(|| value.to_string(), |x| fmt_f64(x, unit));

        macro_rules! emit {
            ($level:expr) => {
                tracing::event!(
                    target: "stdctx::telctx",
                    $level,
                    op,
                    metric,
                    value = %value,
                    unit = %unit,
                    display = %shown,
                    "Metric {}", op
                )
            };
        }

        if self.level == Level::TRACE {
            emit!(Level::TRACE);
        } else if self.level == Level::DEBUG {
            emit!(Level::DEBUG);
        } else if self.level == Level::INFO {
            emit!(Level::INFO);
        } else if self.level == Level::WARN {
            emit!(Level::WARN);
        } else {
            emit!(Level::ERROR);
        }
    }
}

impl Collector for TracingCollector {
    fn incr(&self, metric: &str, value: MetricValue, unit: Unit) {
        self.record("incr", metric, &value, &unit);
    }

    fn set(&self, metric: &str, value: MetricValue, unit: Unit) {
        self.record("set", metric, &value, &unit);
    }
}
