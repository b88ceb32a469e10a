//! Application configuration loaded from TOML.
//!
//! # Invariants
//! - Every field has a default; an absent file yields `AppConfig::default()`.
//! - Unknown keys are rejected so typos do not silently fall back.

use crate::db::DB_FILE_NAME;
use crate::identity::CurrentUser;
use crate::logging::default_log_level;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Data directory used when neither config nor flags name one.
pub const DEFAULT_DATA_DIR: &str = ".climarisk";

/// Delay inserted after writes before the next screen renders.
pub const DEFAULT_WRITE_DELAY_MS: u64 = 500;

const LOG_SUBDIR: &str = "logs";

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "failed to read config `{}`: {source}", path.display())
            }
            Self::Parse(err) => write!(f, "invalid config: {err}"),
            Self::Invalid(message) => write!(f, "invalid config: {message}"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(value: toml::de::Error) -> Self {
        Self::Parse(value)
    }
}

/// `[identity]` table: the signed-in user as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentityConfig {
    pub user_id: String,
    #[serde(default)]
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub log_level: Option<String>,
    /// Absolute directory for rolling logs; defaults to `<data_dir>/logs`.
    pub log_dir: Option<PathBuf>,
    pub write_delay_ms: u64,
    pub identity: Option<IdentityConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            log_level: None,
            log_dir: None,
            write_delay_ms: DEFAULT_WRITE_DELAY_MS,
            identity: None,
        }
    }
}

impl AppConfig {
    /// Parses and validates TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads config from `path`; a missing file is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Loads config from `path` when the file exists, defaults otherwise.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// SQLite file inside the data directory.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE_NAME)
    }

    pub fn write_delay(&self) -> Duration {
        Duration::from_millis(self.write_delay_ms)
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or(default_log_level())
    }

    /// Log directory resolved against `cwd` when configured relative.
    pub fn resolved_log_dir(&self, cwd: &Path) -> PathBuf {
        let dir = self
            .log_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join(LOG_SUBDIR));
        if dir.is_absolute() {
            dir
        } else {
            cwd.join(dir)
        }
    }

    pub fn current_user(&self) -> Option<CurrentUser> {
        self.identity.as_ref().map(|identity| CurrentUser {
            id: identity.user_id.clone(),
            first_name: identity.first_name.clone(),
        })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.data_dir.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("data_dir cannot be empty".to_string()));
        }
        if let Some(identity) = &self.identity {
            if identity.user_id.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "identity.user_id cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}
