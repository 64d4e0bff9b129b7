//! Structured logging.
//!
//! Everything in this crate logs through `tracing`. Where those events go is decided
//! by a [`Logger`] value carried in the dispatcher configuration rather than by a
//! process-wide subscriber: the dispatcher runs registration and every request
//! inside [`Logger::in_scope`], so two dispatchers in one process can log to
//! different places, and a dispatcher built with the default logger stays silent.
//!
//! [`init_logger`] builds a `tracing-subscriber` stack (env filter plus a JSON or
//! pretty fmt layer) wrapped in a `Logger`. It never installs anything globally.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fmt;
use tracing::subscriber::NoSubscriber;
use tracing::{Dispatch, Subscriber};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json, // Default to JSON
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Build a subscriber at all; when false the dispatcher logs nowhere
    pub enabled: bool,
    /// Output format
    pub format: LogFormat,
    /// `EnvFilter` directives, e.g. `info` or `brrtmux=debug,warn`
    pub filter: String,
    /// Include file:line location (dev only)
    pub include_location: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            format: LogFormat::Json,
            filter: "info".to_string(),
            include_location: false,
        }
    }
}

#[derive(Clone)]
enum Target {
    Scoped(Dispatch),
    Inherit,
}

/// Where a dispatcher's `tracing` events go.
#[derive(Clone)]
pub struct Logger {
    target: Target,
}

impl Logger {
    /// Discard everything.
    pub fn disabled() -> Self {
        Self {
            target: Target::Scoped(Dispatch::new(NoSubscriber::default())),
        }
    }

    /// Use whatever subscriber is current for the calling thread (or the global
    /// default).
    pub fn inherit() -> Self {
        Self {
            target: Target::Inherit,
        }
    }

    /// Send events to `subscriber`.
    pub fn from_subscriber<S>(subscriber: S) -> Self
    where
        S: Subscriber + Send + Sync + 'static,
    {
        Self {
            target: Target::Scoped(Dispatch::new(subscriber)),
        }
    }

    /// Run `f` with this logger as the thread's default subscriber.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        match &self.target {
            Target::Scoped(dispatch) => tracing::dispatcher::with_default(dispatch, f),
            Target::Inherit => f(),
        }
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::disabled()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let target = match &self.target {
            Target::Scoped(dispatch) if dispatch.is::<NoSubscriber>() => "disabled",
            Target::Scoped(_) => "scoped",
            Target::Inherit => "inherit",
        };
        f.debug_struct("Logger").field("target", &target).finish()
    }
}

/// Build a logger writing to stdout.
pub fn init_logger(config: &LogConfig) -> Result<Logger> {
    init_logger_with_writer(config, std::io::stdout)
}

/// Build a logger writing to `writer`.
pub fn init_logger_with_writer<W>(config: &LogConfig, writer: W) -> Result<Logger>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    if !config.enabled {
        return Ok(Logger::disabled());
    }

    let env_filter = EnvFilter::try_new(&config.filter)
        .with_context(|| format!("invalid log filter `{}`", config.filter))?;

    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_span_list(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_writer(writer)
            .boxed(),
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer);
    Ok(Logger::from_subscriber(subscriber))
}
