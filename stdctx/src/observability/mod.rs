//! Observability setup.
//!
//! Installs the `tracing-subscriber` stack that the tracing-backed logger
//! and collector write into.

mod subscriber;

pub use subscriber::{instrumented_context, LogFormat, LoggingConfig};
