//! Configuration structs with defaults and RON persistence.

use std::path::{Path, PathBuf};

use glam::UVec3;
use nebula_vox::{DEFAULT_MAX_DICT_VALUE_LEN, HeaderPolicy, ParseOptions};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name of the persisted config inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.ron";

/// Per-user config directory, e.g. `~/.config/nebula-voxtool` on Linux.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("nebula-voxtool"))
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// How `.vox` files are parsed and converted.
    pub loader: LoaderConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
}

/// `.vox` loading configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoaderConfig {
    /// Times each model is tiled along the engine X, Y and Z axes.
    pub repeat: [u32; 3],
    /// Reject files with a bad magic number or a version below 150.
    pub strict_header: bool,
    /// Longest accepted `_r` / `_t` attribute value, in bytes.
    pub max_dict_value_len: usize,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
    /// Also write JSON logs to a file in the log directory.
    pub log_to_file: bool,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            repeat: [1, 1, 1],
            strict_header: true,
            max_dict_value_len: DEFAULT_MAX_DICT_VALUE_LEN,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_to_file: false,
        }
    }
}

impl LoaderConfig {
    pub fn repeat(&self) -> UVec3 {
        UVec3::from_array(self.repeat)
    }

    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions {
            header_policy: if self.strict_header {
                HeaderPolicy::Strict
            } else {
                HeaderPolicy::Lenient
            },
            max_dict_value_len: self.max_dict_value_len,
        }
    }
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            let config = Self::read(&config_path)?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    fn read(config_path: &Path) -> Result<Self, ConfigError> {
        let contents =
            std::fs::read_to_string(config_path).map_err(|source| ConfigError::ReadError {
                path: config_path.to_path_buf(),
                source,
            })?;
        let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    /// Save config to the given directory as `config.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let write_error = |source| ConfigError::WriteError {
            path: config_path.clone(),
            source,
        };

        std::fs::create_dir_all(config_dir).map_err(write_error)?;

        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(write_error)?;
        Ok(())
    }

    /// Returns `Some(new_config)` if the file on disk differs from `self`.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let new_config = Self::read(&config_dir.join(CONFIG_FILE_NAME))?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }

    /// Rejects values the loader cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.loader.repeat.contains(&0) {
            return Err(ConfigError::Invalid {
                field: "loader.repeat",
                reason: format!("every axis must be at least 1, got {:?}", self.loader.repeat),
            });
        }
        if self.loader.max_dict_value_len == 0 {
            return Err(ConfigError::Invalid {
                field: "loader.max_dict_value_len",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }
}
