//! Structured logging configuration.

use crate::config::LoggingSettings;
use crate::{Error, Result};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Environment variable overriding the configured filter directive.
pub const LOG_FILTER_ENV: &str = "RUST_LOG";

/// Directive used when neither config nor environment provide one.
pub const DEFAULT_FILTER: &str = "tally=warn";

/// Directive used with `--verbose`.
pub const VERBOSE_FILTER: &str = "tally=debug";

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable multi-line output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Returns the config-file spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pretty => "pretty",
            Self::Json => "json",
        }
    }
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(Error::InvalidInput(format!(
                "unknown log format '{other}' (expected 'pretty' or 'json')"
            ))),
        }
    }
}

/// Resolved logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Output format.
    pub format: LogFormat,
    /// `EnvFilter` directive.
    pub filter: String,
    /// Optional log file; stderr otherwise.
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            filter: DEFAULT_FILTER.to_string(),
            file: None,
        }
    }
}

impl LoggingConfig {
    /// Builds a config from file settings with environment overrides.
    ///
    /// Filter precedence: `RUST_LOG`, then `--verbose`, then the config file,
    /// then [`DEFAULT_FILTER`].
    #[must_use]
    pub fn from_settings(settings: Option<&LoggingSettings>, verbose: bool) -> Self {
        let env_filter = std::env::var(LOG_FILTER_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty());
        Self::resolve(settings, verbose, env_filter)
    }

    fn resolve(
        settings: Option<&LoggingSettings>,
        verbose: bool,
        env_filter: Option<String>,
    ) -> Self {
        let configured = settings.and_then(|s| s.filter.clone());
        let filter = env_filter
            .or_else(|| verbose.then(|| VERBOSE_FILTER.to_string()))
            .or(configured)
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());

        Self {
            format: settings.map(|s| s.format).unwrap_or_default(),
            filter,
            file: settings.and_then(|s| s.file.clone()),
        }
    }
}
