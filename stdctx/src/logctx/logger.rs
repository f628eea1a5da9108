//! Loggers, records and the handler seam.

use super::attrs::Attr;
use super::handlers::DiscardHandler;
use super::Level;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// A single log event, as seen by a [`Handler`].
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    /// When the record was created.
    pub time: DateTime<Utc>,
    /// Severity.
    pub level: Level,
    /// The message.
    pub message: String,
    /// Group path of the logger that produced the record, outermost first.
    pub groups: Vec<String>,
    /// Bound and call-site attributes, keys qualified by their group path.
    pub attrs: Vec<Attr>,
}

impl Record {
    /// Returns the group path joined with dots, empty at the top level.
    #[must_use]
    pub fn group_path(&self) -> String {
        self.groups.join(".")
    }

    /// Returns the attributes as a JSON object. Later keys win on collision.
    #[must_use]
    pub fn attrs_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .attrs
            .iter()
            .map(|a| (a.key.clone(), a.value.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }

    /// Looks up an attribute by its qualified key.
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&Attr> {
        self.attrs.iter().rev().find(|a| a.key == key)
    }
}

/// Receives records from a [`Logger`].
///
/// Handlers decide where records go; formatting and transport are left to
/// the handler (and usually to `tracing-subscriber` behind it).
pub trait Handler: Send + Sync {
    /// Returns whether records at `level` would be handled.
    fn enabled(&self, level: Level) -> bool;

    /// Handles a record. Must not panic.
    fn handle(&self, record: &Record);
}

/// A structured logger: a handler plus the groups and attributes bound to it.
///
/// Cloning is cheap; `with_group` and `with_attrs` return new loggers and
/// leave the receiver untouched.
#[derive(Clone)]
pub struct Logger {
    handler: Arc<dyn Handler>,
    groups: Vec<String>,
    attrs: Vec<Attr>,
}

impl Logger {
    /// Creates a logger that sends records to `handler`.
    #[must_use]
    pub fn new(handler: Arc<dyn Handler>) -> Self {
        Self {
            handler,
            groups: Vec::new(),
            attrs: Vec::new(),
        }
    }

    /// Returns the shared no-op logger.
    #[must_use]
    pub fn discard() -> Self {
        static DISCARD: OnceLock<Logger> = OnceLock::new();
        DISCARD
            .get_or_init(|| Self::new(Arc::new(DiscardHandler)))
            .clone()
    }

    /// Returns a logger whose later attributes are nested under `name`.
    ///
    /// An empty name returns an identical logger.
    #[must_use]
    pub fn with_group(&self, name: &str) -> Self {
        let mut logger = self.clone();
        if !name.is_empty() {
            logger.groups.push(name.to_string());
        }
        logger
    }

    /// Returns a logger that adds `attrs` to every record.
    ///
    /// The attributes are qualified by the groups open at this point.
    #[must_use]
    pub fn with_attrs(&self, attrs: &[Attr]) -> Self {
        let mut logger = self.clone();
        logger
            .attrs
            .extend(attrs.iter().map(|a| a.qualified(&self.groups)));
        logger
    }

    /// Returns the open groups, outermost first.
    #[must_use]
    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    /// Returns the handler.
    #[must_use]
    pub fn handler(&self) -> &Arc<dyn Handler> {
        &self.handler
    }

    /// Returns whether a record at `level` would be handled.
    #[must_use]
    pub fn enabled(&self, level: Level) -> bool {
        self.handler.enabled(level)
    }

    /// Logs `message` at `level` with call-site attributes.
    pub fn log(&self, level: Level, message: &str, attrs: &[Attr]) {
        if !self.enabled(level) {
            return;
        }
        let mut all = self.attrs.clone();
        all.extend(attrs.iter().map(|a| a.qualified(&self.groups)));
        let record = Record {
            time: Utc::now(),
            level,
            message: message.to_string(),
            groups: self.groups.clone(),
            attrs: all,
        };
        self.handler.handle(&record);
    }

    /// Logs pre-formatted arguments. Formatting is skipped when disabled.
    pub fn log_args(&self, level: Level, args: fmt::Arguments<'_>) {
        if !self.enabled(level) {
            return;
        }
        match args.as_str() {
            Some(s) => self.log(level, s, &[]),
            None => self.log(level, &args.to_string(), &[]),
        }
    }

    /// Logs at [`Level::Trace`].
    pub fn trace(&self, message: &str, attrs: &[Attr]) {
        self.log(Level::Trace, message, attrs);
    }

    /// Logs at [`Level::Debug`].
    pub fn debug(&self, message: &str, attrs: &[Attr]) {
        self.log(Level::Debug, message, attrs);
    }

    /// Logs at [`Level::Info`].
    pub fn info(&self, message: &str, attrs: &[Attr]) {
        self.log(Level::Info, message, attrs);
    }

    /// Logs at [`Level::Warn`].
    pub fn warn(&self, message: &str, attrs: &[Attr]) {
        self.log(Level::Warn, message, attrs);
    }

    /// Logs at [`Level::Error`].
    pub fn error(&self, message: &str, attrs: &[Attr]) {
        self.log(Level::Error, message, attrs);
    }

    /// Logs at [`Level::Fatal`]. Does not exit.
    pub fn fatal(&self, message: &str, attrs: &[Attr]) {
        self.log(Level::Fatal, message, attrs);
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("groups", &self.groups)
            .field("attrs", &self.attrs)
            .finish_non_exhaustive()
    }
}
