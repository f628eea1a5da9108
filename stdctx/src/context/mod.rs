//! The request-scoped context carrier.
//!
//! This module provides:
//! - An immutable, typed key-value `Context`
//! - Cooperative cancellation and deadlines shared down the context tree
//! - A task-local ambient context for code that cannot thread one through

mod cancellation;
mod scope;
mod values;

pub use cancellation::{CancelCallback, CancelHandle, CancellationToken};
pub use values::{Context, ContextKey};
