//! Handler implementations.

use super::logger::{Handler, Record};
use super::Level;
use parking_lot::RwLock;

/// A handler that discards every record.
///
/// Used as the default when no logger is set on a context.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardHandler;

impl Handler for DiscardHandler {
    fn enabled(&self, _level: Level) -> bool {
        false
    }

    fn handle(&self, _record: &Record) {
        // Intentionally empty - discards all records
    }
}

/// A handler that forwards records to the `tracing` framework.
///
/// The group path and attributes become the `group` and `attrs` fields;
/// output format is whatever subscriber is installed.
#[derive(Debug, Clone, Copy)]
pub struct TracingHandler {
    min_level: Level,
}

impl Default for TracingHandler {
    fn default() -> Self {
        Self {
            min_level: Level::Trace,
        }
    }
}

impl TracingHandler {
    /// Creates a tracing handler that drops records below `min_level`.
    #[must_use]
    pub const fn new(min_level: Level) -> Self {
        Self { min_level }
    }

    /// Returns the minimum level.
    #[must_use]
    pub const fn min_level(&self) -> Level {
        self.min_level
    }
}

macro_rules! emit {
    ($level:expr, $record:expr, $group:expr, $attrs:expr, $fatal:expr) => {
        tracing::event!(
            target: "stdctx::logctx",
            $level,
            group = %$group,
            attrs = %$attrs,
            fatal = $fatal,
            "{}", $record.message
        )
    };
}

impl Handler for TracingHandler {
    fn enabled(&self, level: Level) -> bool {
        if level < self.min_level {
            return false;
        }
        match level {
            Level::Trace => tracing::enabled!(target: "stdctx::logctx", tracing::Level::TRACE),
            Level::Debug => tracing::enabled!(target: "stdctx::logctx", tracing::Level::DEBUG),
            Level::Info => tracing::enabled!(target: "stdctx::logctx", tracing::Level::INFO),
            Level::Warn => tracing::enabled!(target: "stdctx::logctx", tracing::Level::WARN),
            Level::Error | Level::Fatal => {
                tracing::enabled!(target: "stdctx::logctx", tracing::Level::ERROR)
            }
        }
    }

    fn handle(&self, record: &Record) {
        let group = record.group_path();
        let attrs = record.attrs_json();
        match record.level {
            Level::Trace => emit!(tracing::Level::TRACE, record, group, attrs, false),
            Level::Debug => emit!(tracing::Level::DEBUG, record, group, attrs, false),
            Level::Info => emit!(tracing::Level::INFO, record, group, attrs, false),
            Level::Warn => emit!(tracing::Level::WARN, record, group, attrs, false),
            Level::Error => emit!(tracing::Level::ERROR, record, group, attrs, false),
            Level::Fatal => emit!(tracing::Level::ERROR, record, group, attrs, true),
        }
    }
}

/// A handler that keeps records in memory, for tests.
#[derive(Debug)]
pub struct CollectingHandler {
    min_level: Level,
    records: RwLock<Vec<Record>>,
}

impl Default for CollectingHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectingHandler {
    /// Creates a handler that collects every level.
    #[must_use]
    pub fn new() -> Self {
        Self::with_min_level(Level::Trace)
    }

    /// Creates a handler that only collects records at or above `min_level`.
    #[must_use]
    pub fn with_min_level(min_level: Level) -> Self {
        Self {
            min_level,
            records: RwLock::new(Vec::new()),
        }
    }

    /// Returns all collected records.
    #[must_use]
    pub fn records(&self) -> Vec<Record> {
        self.records.read().clone()
    }

    /// Returns the collected messages, in order.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.records.read().iter().map(|r| r.message.clone()).collect()
    }

    /// Returns records at exactly `level`.
    #[must_use]
    pub fn records_at(&self, level: Level) -> Vec<Record> {
        self.records
            .read()
            .iter()
            .filter(|r| r.level == level)
            .cloned()
            .collect()
    }

    /// Returns the number of collected records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Returns true if nothing has been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Clears all collected records.
    pub fn clear(&self) {
        self.records.write().clear();
    }
}

impl Handler for CollectingHandler {
    fn enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }

    fn handle(&self, record: &Record) {
        self.records.write().push(record.clone());
    }
}
