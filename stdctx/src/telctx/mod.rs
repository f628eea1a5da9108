//! Context-scoped metrics collection.
//!
//! A [`Collector`] is stored on a [`Context`] and fetched with
//! [`from_context`], which falls back to a [`NullCollector`]. [`group`] wraps
//! the current collector so every metric recorded below it is prefixed with
//! the group name.
//!
//! ```
//! use std::sync::Arc;
//! use stdctx::context::Context;
//! use stdctx::telctx::{self, MemoryCollector, MetricValue};
//! use stdctx::units::Unit;
//!
//! let metrics = Arc::new(MemoryCollector::new());
//! let ctx = telctx::new_context(&Context::background(), metrics.clone());
//! let ctx = telctx::group(&ctx, "http");
//! telctx::incr(&ctx, "bytes_out", 512u64, Unit::Bytes);
//!
//! assert_eq!(metrics.counter("/http/bytes_out"), Some(MetricValue::Uint(512)));
//! ```

mod collector;
mod logging;
mod memory;
mod value;

pub use collector::{Collector, NullCollector, PrefixedCollector};
pub use logging::TracingCollector;
pub use memory::{MemoryCollector, MetricEntry, MetricsSnapshot};
pub use value::{Incrementable, Markable, MetricValue};

#[cfg(test)]
pub(crate) use collector::MockCollector;

use crate::context::{Context, ContextKey};
use crate::units::Unit;
use std::sync::{Arc, OnceLock};

struct CollectorKey;

impl ContextKey for CollectorKey {
    type Value = Arc<dyn Collector>;
}

fn null_collector() -> Arc<dyn Collector> {
    static NULL: OnceLock<Arc<dyn Collector>> = OnceLock::new();
    NULL.get_or_init(|| Arc::new(NullCollector)).clone()
}

/// Returns a context carrying `collector`.
#[must_use]
pub fn new_context(ctx: &Context, collector: Arc<dyn Collector>) -> Context {
    ctx.with_value::<CollectorKey>(collector)
}

/// Returns the context's collector, or a [`NullCollector`] if none is set.
#[must_use]
pub fn from_context(ctx: &Context) -> Arc<dyn Collector> {
    ctx.value::<CollectorKey>()
        .cloned()
        .unwrap_or_else(null_collector)
}

/// Returns the collector of the ambient [`Context::current`].
#[must_use]
pub fn current() -> Arc<dyn Collector> {
    from_context(&Context::current())
}

/// Returns true if a collector is set on the context.
#[must_use]
pub fn is_set(ctx: &Context) -> bool {
    ctx.contains::<CollectorKey>()
}

/// Returns a context whose collector prefixes metrics with `/name`.
///
/// An empty name returns the context unchanged. Without a collector the
/// null collector is wrapped, so the result reports [`is_set`] but records
/// nothing.
#[must_use]
pub fn group(ctx: &Context, name: &str) -> Context {
    if name.is_empty() {
        return ctx.clone();
    }
    new_context(ctx, Arc::new(PrefixedCollector::new(from_context(ctx), name)))
}

/// Returns a context with the collector removed.
#[must_use]
pub fn remove(ctx: &Context) -> Context {
    ctx.without::<CollectorKey>()
}

/// Increments the counter `metric` by `x`.
pub fn incr<T: Incrementable>(ctx: &Context, metric: &str, x: T, unit: Unit) {
    from_context(ctx).incr(metric, x.into(), unit);
}

/// Sets the gauge `metric` to `x`.
pub fn mark<T: Markable>(ctx: &Context, metric: &str, x: T, unit: Unit) {
    from_context(ctx).set(metric, x.into(), unit);
}
