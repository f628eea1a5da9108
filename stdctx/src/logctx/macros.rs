//! Formatting macros for context-scoped logging.
//!
//! Each macro takes a `&Context` followed by `format!`-style arguments. The
//! message is only formatted when the context's logger accepts the level.

/// Logs a formatted message at the given level.
///
/// ```
/// use stdctx::context::Context;
/// use stdctx::logctx::Level;
///
/// let ctx = Context::background();
/// stdctx::log_ctx!(&ctx, Level::Info, "listening on {}", 8080);
/// ```
#[macro_export]
macro_rules! log_ctx {
    ($ctx:expr, $level:expr, $($arg:tt)+) => {
        $crate::logctx::log_args($ctx, $level, ::std::format_args!($($arg)+))
    };
}

/// Logs a formatted message at trace level.
#[macro_export]
macro_rules! trace_ctx {
    ($ctx:expr, $($arg:tt)+) => {
        $crate::log_ctx!($ctx, $crate::logctx::Level::Trace, $($arg)+)
    };
}

/// Logs a formatted message at debug level.
#[macro_export]
macro_rules! debug_ctx {
    ($ctx:expr, $($arg:tt)+) => {
        $crate::log_ctx!($ctx, $crate::logctx::Level::Debug, $($arg)+)
    };
}

/// Logs a formatted message at info level.
#[macro_export]
macro_rules! info_ctx {
    ($ctx:expr, $($arg:tt)+) => {
        $crate::log_ctx!($ctx, $crate::logctx::Level::Info, $($arg)+)
    };
}

/// Logs a formatted message at warn level.
#[macro_export]
macro_rules! warn_ctx {
    ($ctx:expr, $($arg:tt)+) => {
        $crate::log_ctx!($ctx, $crate::logctx::Level::Warn, $($arg)+)
    };
}

/// Logs a formatted message at error level.
#[macro_export]
macro_rules! error_ctx {
    ($ctx:expr, $($arg:tt)+) => {
        $crate::log_ctx!($ctx, $crate::logctx::Level::Error, $($arg)+)
    };
}

/// Logs a formatted message at fatal level. Does not exit.
#[macro_export]
macro_rules! fatal_ctx {
    ($ctx:expr, $($arg:tt)+) => {
        $crate::log_ctx!($ctx, $crate::logctx::Level::Fatal, $($arg)+)
    };
}
