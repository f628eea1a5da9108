//! Namespacing every managed resource under one name.

use crate::context::Context;
use crate::{logctx, telctx};

/// Selects which resources [`child_with`] namespaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChildOptions {
    logging: bool,
    telemetry: bool,
}

impl Default for ChildOptions {
    fn default() -> Self {
        Self {
            logging: true,
            telemetry: true,
        }
    }
}

impl ChildOptions {
    /// Namespaces every resource.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Leaves the logger as it is.
    #[must_use]
    pub const fn without_logging(mut self) -> Self {
        self.logging = false;
        self
    }

    /// Leaves the metrics collector as it is.
    #[must_use]
    pub const fn without_telemetry(mut self) -> Self {
        self.telemetry = false;
        self
    }
}

/// Returns a child context whose logger and metrics are grouped under `name`.
///
/// ```
/// use std::sync::Arc;
/// use stdctx::context::Context;
/// use stdctx::telctx::{self, MemoryCollector};
/// use stdctx::units::Unit;
///
/// let metrics = Arc::new(MemoryCollector::new());
/// let ctx = telctx::new_context(&Context::background(), metrics.clone());
/// let ctx = stdctx::child(&ctx, "cache");
/// telctx::incr(&ctx, "hits", 1u32, Unit::None);
/// assert!(metrics.counter("/cache/hits").is_some());
/// ```
#[must_use]
pub fn child(ctx: &Context, name: &str) -> Context {
    child_with(ctx, name, ChildOptions::default())
}

/// Like [`child`], limited to the resources selected in `options`.
#[must_use]
pub fn child_with(ctx: &Context, name: &str, options: ChildOptions) -> Context {
    let mut ctx = ctx.clone();
    if options.logging {
        ctx = logctx::group(&ctx, name);
    }
    if options.telemetry {
        ctx = telctx::group(&ctx, name);
    }
    ctx
}
