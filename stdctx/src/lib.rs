//! # stdctx
//!
//! Context-scoped access to the ambient resources a program threads through
//! its call graph.
//!
//! A [`context::Context`] is an immutable, cheaply cloned bag of values with
//! optional cancellation and deadline. The modules here store one resource
//! each on it:
//!
//! - **Logging** ([`logctx`]): a structured logger, grouped by component
//! - **Metrics** ([`telctx`]): a collector whose metric names nest under groups
//! - **Networking** ([`netctx`]): a dialer and listener instead of raw sockets
//!
//! Logging and metrics fall back to null objects when nothing is installed,
//! so library code can log and count unconditionally.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use stdctx::prelude::*;
//!
//! let logs = Arc::new(CollectingHandler::new());
//! let metrics = Arc::new(MemoryCollector::new());
//!
//! let ctx = logctx::new_context(&Context::background(), Logger::new(logs.clone()));
//! let ctx = telctx::new_context(&ctx, metrics.clone());
//! let ctx = stdctx::child(&ctx, "db");
//!
//! logctx::info(&ctx, "connected", &[logctx::attrs::string("host", "localhost")]);
//! telctx::incr(&ctx, "queries", 1u32, Unit::None);
//!
//! assert_eq!(logs.records()[0].attrs[0].key, "db.host");
//! assert!(metrics.counter("/db/queries").is_some());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

mod child;
pub mod context;
pub mod errors;
pub mod logctx;
#[cfg(feature = "net")]
pub mod netctx;
pub mod observability;
pub mod telctx;
pub mod units;

pub use child::{child, child_with, ChildOptions};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::child::{child, child_with, ChildOptions};
    pub use crate::context::{CancelHandle, Context, ContextKey};
    pub use crate::errors::{ConfigError, ContextError, NetError, StdctxError};
    pub use crate::logctx::{self, Attr, CollectingHandler, Handler, Level, Logger};
    pub use crate::observability::{instrumented_context, LogFormat, LoggingConfig};
    pub use crate::telctx::{self, Collector, MemoryCollector, MetricValue};
    pub use crate::units::Unit;

    #[cfg(feature = "net")]
    pub use crate::netctx::{self, Dialer, Listener, Network, Stack};
}

#[cfg(test)]
pub(crate) mod testing;
