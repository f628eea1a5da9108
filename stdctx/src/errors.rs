//! Error types for stdctx.
//!
//! Each concern has its own error enum; `StdctxError` wraps all of them for
//! callers that want a single error type.

use std::io;
use thiserror::Error;

/// The umbrella error type for stdctx operations.
#[derive(Debug, Error)]
pub enum StdctxError {
    /// The context was cancelled or its deadline passed.
    #[error("{0}")]
    Context(#[from] ContextError),

    /// A network operation failed.
    #[error("{0}")]
    Net(#[from] NetError),

    /// A value could not be parsed.
    #[error("{0}")]
    Parse(#[from] ParseError),

    /// Logging could not be configured.
    #[error("{0}")]
    Config(#[from] ConfigError),
}

/// Why a context is done.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    /// The context, or one of its ancestors, was cancelled.
    #[error("context cancelled: {0}")]
    Cancelled(String),

    /// The context deadline passed.
    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Errors from the context-scoped network helpers.
#[derive(Debug, Error)]
pub enum NetError {
    /// No dialer was registered on the context.
    #[error("no dialer available in this context")]
    NoDialer,

    /// No listener was registered on the context.
    #[error("no listener available in this context")]
    NoListener,

    /// The network name is unknown, or not valid for the operation.
    #[error("unsupported network: {0}")]
    UnsupportedNetwork(String),

    /// The address could not be resolved for the requested network.
    #[error("invalid address {addr:?}: {reason}")]
    InvalidAddress {
        /// The address as given.
        addr: String,
        /// What was wrong with it.
        reason: String,
    },

    /// The context ended before the operation completed.
    #[error("{0}")]
    Context(#[from] ContextError),

    /// IO error from the underlying socket.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl NetError {
    /// Creates an invalid address error.
    #[must_use]
    pub fn invalid_address(addr: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidAddress {
            addr: addr.into(),
            reason: reason.into(),
        }
    }
}

/// Error raised when parsing a level, unit or format name fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {kind}: {value:?}")]
pub struct ParseError {
    /// What was being parsed (e.g. "level").
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl ParseError {
    /// Creates a new parse error.
    #[must_use]
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}

/// Errors from installing the tracing subscriber.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The filter directive could not be parsed.
    #[error("invalid log filter {filter:?}: {reason}")]
    InvalidFilter {
        /// The filter directive.
        filter: String,
        /// Parser message.
        reason: String,
    },

    /// A global subscriber was already installed.
    #[error("global subscriber already installed: {0}")]
    AlreadyInstalled(String),

    /// A configuration value could not be parsed.
    #[error("{0}")]
    Parse(#[from] ParseError),
}
