//! SBun configuration.
//!
//! Configuration lives in `$XDG_CONFIG_HOME/sbun/config.toml` (or
//! `~/.config/sbun/config.toml`). Every key is optional:
//!
//! ```toml
//! [logging]
//! level = "info"
//!
//! [concat]
//! compress = true
//!
//! [tasks_with_logs]
//! dir_name = "tasks_with_logs"
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::links::TASKS_WITH_LOGS_DIR_NAME;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV_VAR: &str = "SBUN_CONFIG";

const CONFIG_DIR: &str = "sbun";
const CONFIG_FILE: &str = "config.toml";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Log concatenation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConcatConfig {
    /// Write `stdout_all.gz`/`stderr_all.gz` instead of plain files
    #[serde(default = "default_compress")]
    pub compress: bool,
}

fn default_compress() -> bool {
    true
}

impl Default for ConcatConfig {
    fn default() -> Self {
        Self {
            compress: default_compress(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinksConfig {
    /// A single directory name; `tasks` and paths are refused when linking
    #[serde(default = "default_links_dir_name")]
    pub dir_name: String,
}

fn default_links_dir_name() -> String {
    TASKS_WITH_LOGS_DIR_NAME.to_string()
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            dir_name: default_links_dir_name(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SbunConfig {
    #[serde(default)]
    pub logging: LogConfig,

    #[serde(default)]
    pub concat: ConcatConfig,

    #[serde(default)]
    pub tasks_with_logs: LinksConfig,
}

impl SbunConfig {
    /// Load configuration.
    ///
    /// An explicit path (argument, then `$SBUN_CONFIG`) must exist. The
    /// default user config is optional; without it the defaults apply.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));
        if let Some(path) = explicit {
            return Self::load_from_path(&path);
        }

        match user_config_path() {
            Some(path) => match Self::load_from_path(&path) {
                Err(ConfigError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                    Ok(Self::default())
                }
                other => other,
            },
            None => Ok(Self::default()),
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }
}

/// Default user config path, if a config directory can be determined.
pub fn user_config_path() -> Option<PathBuf> {
    let config_dir = if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
        PathBuf::from(xdg)
    } else {
        let home = std::env::var_os("HOME")?;
        PathBuf::from(home).join(".config")
    };

    Some(config_dir.join(CONFIG_DIR).join(CONFIG_FILE))
}
