//! Configuration management.
//!
//! Configuration is read from a TOML file. Lookup order for the binary:
//! `--config`, then `TALLY_CONFIG_PATH`, then the platform config directory,
//! then `~/.config/tally/config.toml`. Missing files yield defaults.
//!
//! ```toml
//! data_dir = "/home/me/.local/share/tally"
//!
//! [storage]
//! file_name = "tally.db"
//! enabled = true
//! busy_timeout_ms = 5000
//!
//! [logging]
//! format = "pretty"
//! filter = "tally=info"
//! file = "/tmp/tally.log"
//! ```

use crate::observability::LogFormat;
use crate::storage::sqlite::DEFAULT_BUSY_TIMEOUT;
use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "TALLY_CONFIG_PATH";

/// Default database file name inside the data directory.
pub const DEFAULT_DB_FILE_NAME: &str = "tally.db";

/// Main configuration for tally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyConfig {
    /// Directory holding the database file.
    pub data_dir: PathBuf,
    /// Store settings.
    pub storage: StorageSettings,
    /// Logging settings.
    pub logging: LoggingSettings,
}

/// Store settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSettings {
    /// Database file name, relative to `data_dir`.
    pub file_name: String,
    /// Whether local persistence is allowed at all.
    ///
    /// When false the store reports itself unavailable, exactly as on a
    /// platform without local storage.
    pub enabled: bool,
    /// How long a writer waits on a locked database.
    pub busy_timeout: Duration,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            file_name: DEFAULT_DB_FILE_NAME.to_string(),
            enabled: true,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }
}

/// Logging settings as configured; environment overrides apply at init.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoggingSettings {
    /// Output format.
    pub format: LogFormat,
    /// `EnvFilter` directive, e.g. `tally=debug`.
    pub filter: Option<String>,
    /// Append logs to this file instead of stderr.
    pub file: Option<PathBuf>,
}

/// Configuration file structure (for TOML parsing).
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    /// Data directory.
    pub data_dir: Option<String>,
    /// Storage section.
    pub storage: Option<ConfigFileStorage>,
    /// Logging section.
    pub logging: Option<ConfigFileLogging>,
}

/// Storage section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileStorage {
    /// Database file name.
    pub file_name: Option<String>,
    /// Whether persistence is enabled.
    pub enabled: Option<bool>,
    /// Busy timeout in milliseconds.
    pub busy_timeout_ms: Option<u64>,
}

/// Logging section in config file.
#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileLogging {
    /// `pretty` or `json`.
    pub format: Option<String>,
    /// `EnvFilter` directive.
    pub filter: Option<String>,
    /// Log file path.
    pub file: Option<String>,
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            storage: StorageSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

/// Returns the per-user data directory, falling back to `./.tally`.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    directories::BaseDirs::new().map_or_else(
        || PathBuf::from(".tally"),
        |dirs| dirs.data_local_dir().join("tally"),
    )
}

impl TallyConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Path of the database file.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.storage.file_name)
    }

    /// Loads configuration from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::OperationFailed {
            operation: "read_config_file".to_string(),
            cause: format!("{}: {e}", path.display()),
        })?;

        Self::from_toml(&contents)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if the text is not valid configuration.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(contents).map_err(|e| Error::OperationFailed {
            operation: "parse_config_file".to_string(),
            cause: e.to_string(),
        })?;

        Self::from_config_file(file)
    }

    /// Loads configuration from the default location.
    ///
    /// Checks the following paths in order:
    /// 1. Platform-specific config dir (`~/Library/Application Support/tally/` on macOS)
    /// 2. XDG config dir (`~/.config/tally/` for Unix compatibility)
    ///
    /// Returns default configuration if no readable config file is found.
    #[must_use]
    pub fn load_default() -> Self {
        let Some(base_dirs) = directories::BaseDirs::new() else {
            return Self::default();
        };

        let candidates = [
            base_dirs.config_dir().join("tally").join("config.toml"),
            base_dirs
                .home_dir()
                .join(".config")
                .join("tally")
                .join("config.toml"),
        ];

        for path in candidates.iter().filter(|path| path.exists()) {
            match Self::load_from_file(path) {
                Ok(config) => return config,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Ignoring unreadable config file");
                },
            }
        }

        Self::default()
    }

    /// Converts a `ConfigFile` to `TallyConfig`.
    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let mut config = Self::default();

        if let Some(data_dir) = file.data_dir {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Some(storage) = file.storage {
            if let Some(file_name) = storage.file_name {
                if file_name.trim().is_empty() {
                    return Err(Error::InvalidInput(
                        "storage.file_name must not be empty".to_string(),
                    ));
                }
                config.storage.file_name = file_name;
            }
            if let Some(enabled) = storage.enabled {
                config.storage.enabled = enabled;
            }
            if let Some(ms) = storage.busy_timeout_ms {
                config.storage.busy_timeout = Duration::from_millis(ms);
            }
        }
        if let Some(logging) = file.logging {
            if let Some(format) = logging.format {
                config.logging.format = format.parse()?;
            }
            config.logging.filter = logging.filter;
            config.logging.file = logging.file.map(PathBuf::from);
        }

        Ok(config)
    }

    /// Sets the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_dir = path.into();
        self
    }

    /// Enables or disables local persistence.
    #[must_use]
    pub fn with_storage_enabled(mut self, enabled: bool) -> Self {
        self.storage.enabled = enabled;
        self
    }
}
