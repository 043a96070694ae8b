//! Logging setup for the pdpanel CLI.
//!
//! Reads `PDPANEL_LOG_LEVEL` (default `info`, any `EnvFilter` directive),
//! `PDPANEL_LOG_FORMAT` (`pretty` or `json`) and `PDPANEL_LOG_TARGET`
//! (include the event target). Logs go to stderr so CSV output on stdout
//! stays clean.

use std::env;
use std::str::FromStr;

use thiserror::Error;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::EnvFilter;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogFormat {
    Json,
    Pretty,
}

/// Subscriber settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LoggingConfig {
    pub(crate) level: String,
    pub(crate) format: LogFormat,
    pub(crate) include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            include_target: true,
        }
    }
}

impl LoggingConfig {
    /// `-v` raises the level to debug, `-vv` and above to trace.
    pub(crate) fn apply_verbosity(&mut self, verbose: u8) {
        match verbose {
            0 => {}
            1 => self.level = "debug".to_string(),
            _ => self.level = "trace".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum LoggingInitError {
    #[error("failed to install tracing subscriber: {0}")]
    SetGlobalDefault(#[from] SetGlobalDefaultError),
}

/// Logging configuration from the process environment.
pub(crate) fn logging_config_from_env() -> LoggingConfig {
    logging_config_from_lookup(|key| env::var(key).ok())
}

fn logging_config_from_lookup(lookup: impl Fn(&str) -> Option<String>) -> LoggingConfig {
    let mut config = LoggingConfig::default();

    if let Some(level) = lookup("PDPANEL_LOG_LEVEL").filter(|level| !level.trim().is_empty()) {
        config.level = level.trim().to_string();
    }
    if let Some(format) = lookup("PDPANEL_LOG_FORMAT").and_then(|v| v.parse().ok()) {
        config.format = format;
    }
    if let Some(include_target) = lookup("PDPANEL_LOG_TARGET").and_then(|v| parse_bool(&v)) {
        config.include_target = include_target;
    }

    config
}

/// Install the global subscriber. Unknown level directives fall back to `info`.
pub(crate) fn init_logging(config: &LoggingConfig) -> Result<(), LoggingInitError> {
    let filter = EnvFilter::try_new(&config.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.include_target)
        .with_writer(std::io::stderr)
        .with_ansi(config.format == LogFormat::Pretty);

    match config.format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.pretty().finish())?,
    }
    Ok(())
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" | "text" => Ok(Self::Pretty),
            other => Err(format!("unknown log format {other:?}")),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
