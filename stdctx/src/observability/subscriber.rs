//! Logging configuration and subscriber installation.

use crate::context::Context;
use crate::errors::{ConfigError, ParseError};
use crate::logctx::{self, Level, Logger, TracingHandler};
use crate::telctx::{self, TracingCollector};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter variable checked first.
pub const LOG_ENV: &str = "STDCTX_LOG";
/// Fallback filter variable.
pub const RUST_LOG_ENV: &str = "RUST_LOG";
/// Output format variable.
pub const LOG_FORMAT_ENV: &str = "STDCTX_LOG_FORMAT";

/// How log lines are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, human-oriented.
    Pretty,
    /// One line per event.
    #[default]
    Compact,
    /// Newline-delimited JSON.
    Json,
}

impl FromStr for LogFormat {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "compact" | "text" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            _ => Err(ParseError::new("log format", s)),
        }
    }
}

/// Settings for the global tracing subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// `EnvFilter` directives, e.g. `"info,stdctx=debug"`.
    pub filter: String,
    /// Output format.
    pub format: LogFormat,
    /// Whether to print event targets.
    pub with_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::default(),
            with_target: true,
        }
    }
}

impl LoggingConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter directives.
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }

    /// Sets the output format.
    #[must_use]
    pub const fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// Sets whether targets are printed.
    #[must_use]
    pub const fn with_target(mut self, with_target: bool) -> Self {
        self.with_target = with_target;
        self
    }

    /// Reads `STDCTX_LOG` (or `RUST_LOG`) and `STDCTX_LOG_FORMAT`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from any key lookup, starting from the defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(filter) = lookup(LOG_ENV).or_else(|| lookup(RUST_LOG_ENV)) {
            config.filter = filter;
        }
        if let Some(format) = lookup(LOG_FORMAT_ENV) {
            config.format = format.parse()?;
        }
        Ok(config)
    }

    /// Builds the `EnvFilter` for this configuration.
    pub fn env_filter(&self) -> Result<EnvFilter, ConfigError> {
        EnvFilter::try_new(&self.filter).map_err(|e| ConfigError::InvalidFilter {
            filter: self.filter.clone(),
            reason: e.to_string(),
        })
    }

    /// Installs the global subscriber.
    ///
    /// Fails instead of panicking when a subscriber is already installed.
    pub fn install(&self) -> Result<(), ConfigError> {
        let filter = self.env_filter()?;
        let registry = tracing_subscriber::registry().with(filter);
        let result = match self.format {
            LogFormat::Pretty => registry
                .with(fmt::layer().pretty().with_target(self.with_target))
                .try_init(),
            LogFormat::Compact => registry
                .with(fmt::layer().compact().with_target(self.with_target))
                .try_init(),
            LogFormat::Json => registry
                .with(fmt::layer().json().with_target(self.with_target))
                .try_init(),
        };
        result.map_err(|e| ConfigError::AlreadyInstalled(e.to_string()))?;
        tracing::debug!(filter = %self.filter, format = ?self.format, "Installed tracing subscriber");
        Ok(())
    }
}

/// Returns a context whose logger and collector both write to `tracing`.
///
/// Logging below `min_level` is dropped before reaching the subscriber.
#[must_use]
pub fn instrumented_context(ctx: &Context, min_level: Level) -> Context {
    let ctx = logctx::new_context(ctx, Logger::new(Arc::new(TracingHandler::new(min_level))));
    telctx::new_context(&ctx, Arc::new(TracingCollector::default()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = LoggingConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, LoggingConfig::default());
        assert_eq!(config.filter, "info");
        assert_eq!(config.format, LogFormat::Compact);
    }

    #[test]
    fn test_stdctx_log_wins_over_rust_log() {
        let config = LoggingConfig::from_lookup(lookup(&[
            (LOG_ENV, "debug"),
            (RUST_LOG_ENV, "warn"),
            (LOG_FORMAT_ENV, "JSON"),
        ]))
        .unwrap();
        assert_eq!(config.filter, "debug");
        assert_eq!(config.format, LogFormat::Json);

        let config = LoggingConfig::from_lookup(lookup(&[(RUST_LOG_ENV, "warn")])).unwrap();
        assert_eq!(config.filter, "warn");
    }

    #[test]
    fn test_bad_format() {
        let err = LoggingConfig::from_lookup(lookup(&[(LOG_FORMAT_ENV, "xml")])).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_bad_filter() {
        let config = LoggingConfig::new().with_filter("stdctx=loudest");
        assert!(matches!(
            config.env_filter(),
            Err(ConfigError::InvalidFilter { .. })
        ));
    }

    #[test]
    fn test_serde_defaults() {
        let config: LoggingConfig = serde_json::from_str(r#"{"format": "pretty"}"#).unwrap();
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.filter, "info");
        assert!(config.with_target);
    }

    #[test]
    fn test_install_twice_errors() {
        let config = LoggingConfig::new()
            .with_filter("stdctx=trace")
            .with_format(LogFormat::Compact)
            .with_target(false);
        let _ = config.install();
        assert!(matches!(
            config.install(),
            Err(ConfigError::AlreadyInstalled(_))
        ));
    }

    #[test]
    fn test_instrumented_context() {
        let ctx = instrumented_context(&Context::background(), Level::Info);
        assert!(logctx::is_set(&ctx));
        assert!(telctx::is_set(&ctx));
        logctx::info(&ctx, "routed to tracing", &[]);
        telctx::incr(&ctx, "events", 1u8, crate::units::Unit::None);
    }
}
