//! Context-scoped structured logging.
//!
//! A [`Logger`] is stored on a [`Context`] with [`new_context`] and fetched
//! with [`from_context`], which never fails: without a logger it returns a
//! discarding one. [`group`] nests the logger under a name so everything the
//! callee logs is attributed to its subsystem.
//!
//! ```
//! use std::sync::Arc;
//! use stdctx::context::Context;
//! use stdctx::logctx::{self, attrs, CollectingHandler, Logger};
//!
//! let handler = Arc::new(CollectingHandler::new());
//! let ctx = logctx::new_context(&Context::background(), Logger::new(handler.clone()));
//! let ctx = logctx::group(&ctx, "db");
//! logctx::info(&ctx, "connected", &[attrs::string("host", "localhost")]);
//!
//! let record = &handler.records()[0];
//! assert_eq!(record.attrs[0].key, "db.host");
//! ```

pub mod attrs;
mod handlers;
mod level;
mod logger;
mod macros;

pub use attrs::{Attr, AttrValue};
pub use handlers::{CollectingHandler, DiscardHandler, TracingHandler};
pub use level::Level;
pub use logger::{Handler, Logger, Record};

use crate::context::{Context, ContextKey};
use std::fmt;

struct LoggerKey;

impl ContextKey for LoggerKey {
    type Value = Logger;
}

/// Returns a context carrying `logger`.
#[must_use]
pub fn new_context(ctx: &Context, logger: Logger) -> Context {
    ctx.with_value::<LoggerKey>(logger)
}

/// Returns the context's logger, or the discard logger if none is set.
#[must_use]
pub fn from_context(ctx: &Context) -> Logger {
    ctx.value::<LoggerKey>()
        .cloned()
        .unwrap_or_else(Logger::discard)
}

/// Returns the logger of the ambient [`Context::current`].
#[must_use]
pub fn current() -> Logger {
    from_context(&Context::current())
}

/// Returns true if a logger is set on the context.
#[must_use]
pub fn is_set(ctx: &Context) -> bool {
    ctx.contains::<LoggerKey>()
}

/// Returns a context whose logger is nested under the group `name`.
///
/// Without a logger the grouped discard logger is stored, so the result
/// reports [`is_set`] but still logs nothing.
#[must_use]
pub fn group(ctx: &Context, name: &str) -> Context {
    new_context(ctx, from_context(ctx).with_group(name))
}

/// Returns a context whose logger adds `attrs` to every record.
#[must_use]
pub fn with_attrs(ctx: &Context, attrs: &[Attr]) -> Context {
    match ctx.value::<LoggerKey>() {
        Some(logger) => new_context(ctx, logger.with_attrs(attrs)),
        None => ctx.clone(),
    }
}

/// Returns a context with the logger removed.
#[must_use]
pub fn remove(ctx: &Context) -> Context {
    ctx.without::<LoggerKey>()
}

/// Logs `msg` at `level` to the context's logger.
pub fn log(ctx: &Context, level: Level, msg: &str, attrs: &[Attr]) {
    from_context(ctx).log(level, msg, attrs);
}

/// Logs formatted arguments at `level`. See [`info_ctx!`](crate::info_ctx).
pub fn log_args(ctx: &Context, level: Level, args: fmt::Arguments<'_>) {
    from_context(ctx).log_args(level, args);
}

/// Logs at [`Level::Trace`].
pub fn trace(ctx: &Context, msg: &str, attrs: &[Attr]) {
    log(ctx, Level::Trace, msg, attrs);
}

/// Logs at [`Level::Debug`].
pub fn debug(ctx: &Context, msg: &str, attrs: &[Attr]) {
    log(ctx, Level::Debug, msg, attrs);
}

/// Logs at [`Level::Info`].
pub fn info(ctx: &Context, msg: &str, attrs: &[Attr]) {
    log(ctx, Level::Info, msg, attrs);
}

/// Logs at [`Level::Warn`].
pub fn warn(ctx: &Context, msg: &str, attrs: &[Attr]) {
    log(ctx, Level::Warn, msg, attrs);
}

/// Logs at [`Level::Error`].
pub fn error(ctx: &Context, msg: &str, attrs: &[Attr]) {
    log(ctx, Level::Error, msg, attrs);
}

/// Logs at [`Level::Fatal`]. The process keeps running.
pub fn fatal(ctx: &Context, msg: &str, attrs: &[Attr]) {
    log(ctx, Level::Fatal, msg, attrs);
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn ctx_with_collector() -> (Arc<CollectingHandler>, Context) {
        let handler = Arc::new(CollectingHandler::new());
        let ctx = new_context(&Context::background(), Logger::new(handler.clone()));
        (handler, ctx)
    }

    #[test]
    fn test_from_context_never_fails() {
        let ctx = Context::background();
        let logger = from_context(&ctx);
        assert!(!logger.enabled(Level::Fatal));
        assert!(!is_set(&ctx));
    }

    #[test]
    fn test_is_set() {
        let (_handler, ctx) = ctx_with_collector();
        assert!(is_set(&ctx));
    }

    #[test]
    fn test_remove() {
        let (handler, ctx) = ctx_with_collector();
        let removed = remove(&ctx);
        assert!(!is_set(&removed));
        info(&removed, "lost", &[]);
        assert!(handler.is_empty());

        info(&ctx, "kept", &[]);
        assert_eq!(handler.len(), 1);
    }

    #[test]
    fn test_level_helpers() {
        let (handler, ctx) = ctx_with_collector();
        trace(&ctx, "trace", &[]);
        debug(&ctx, "debug", &[]);
        info(&ctx, "info", &[]);
        warn(&ctx, "warn", &[]);
        error(&ctx, "error", &[]);
        fatal(&ctx, "fatal", &[]);

        let levels: Vec<Level> = handler.records().iter().map(|r| r.level).collect();
        assert_eq!(levels, Level::ALL.to_vec());
    }

    #[test]
    fn test_group_nests() {
        let (handler, ctx) = ctx_with_collector();
        let inner = group(&group(&ctx, "server"), "conn");
        info(&inner, "accepted", &[attrs::int("fd", 7)]);
        info(&ctx, "top", &[attrs::int("fd", 8)]);

        let records = handler.records();
        assert_eq!(records[0].group_path(), "server.conn");
        assert_eq!(records[0].attrs[0].key, "server.conn.fd");
        assert_eq!(records[1].attrs[0].key, "fd");
    }

    #[test]
    fn test_group_without_logger_stores_discard() {
        let ctx = group(&Context::background(), "svc");
        assert!(is_set(&ctx));

        let logger = from_context(&ctx);
        assert_eq!(logger.groups(), ["svc".to_string()]);
        assert!(!logger.enabled(Level::Fatal));
        fatal(&ctx, "dropped", &[]);
    }

    #[test]
    fn test_group_empty_name() {
        let (_handler, ctx) = ctx_with_collector();
        let same = group(&ctx, "");
        assert!(from_context(&same).groups().is_empty());
    }

    #[test]
    fn test_with_attrs() {
        let (handler, ctx) = ctx_with_collector();
        let ctx = with_attrs(&ctx, &[attrs::string("request_id", "r-1")]);
        warn(&ctx, "slow", &[]);
        assert_eq!(handler.records()[0].attrs, vec![attrs::string("request_id", "r-1")]);
    }

    #[tokio::test]
    async fn test_current_uses_ambient_context() {
        let (handler, ctx) = ctx_with_collector();
        ctx.scope(async {
            current().info("ambient", &[]);
        })
        .await;
        assert_eq!(handler.messages(), vec!["ambient"]);
    }
}
