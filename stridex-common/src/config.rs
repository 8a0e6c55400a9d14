//! Configuration loading and data folder resolution
//!
//! Bootstrap settings come from a small TOML file. Nothing in it is required:
//! a missing or unreadable file falls back to compiled defaults.
//!
//! # Data folder priority
//!
//! 1. Command-line argument (highest priority)
//! 2. `STRIDEX_DATA_FOLDER` environment variable
//! 3. `data_folder` in the TOML config file
//! 4. OS-dependent compiled default (fallback)

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::discovery::{DiscoveryLimits, DEFAULT_MAX_ARRAY_PREFIX, DEFAULT_MAX_CANDIDATES, DEFAULT_MAX_DEPTH};
use crate::{Error, Result};

/// Environment variable overriding the data folder
pub const DATA_FOLDER_ENV: &str = "STRIDEX_DATA_FOLDER";

/// Directory name used under the OS config/data directories
pub const APP_DIR_NAME: &str = "stridex";

/// Default HTTP port for stridex-dr
pub const DEFAULT_PORT: u16 = 5740;

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TomlConfig {
    /// Folder holding the input files (optional)
    #[serde(default)]
    pub data_folder: Option<PathBuf>,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// HTTP bind address
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub discovery: DiscoveryConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Candidate discovery bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
    #[serde(default = "default_max_array_prefix")]
    pub max_array_prefix: usize,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

fn default_max_candidates() -> usize {
    DEFAULT_MAX_CANDIDATES
}

fn default_max_array_prefix() -> usize {
    DEFAULT_MAX_ARRAY_PREFIX
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            data_folder: None,
            port: default_port(),
            host: default_host(),
            logging: LoggingConfig::default(),
            discovery: DiscoveryConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            max_array_prefix: DEFAULT_MAX_ARRAY_PREFIX,
        }
    }
}

impl From<DiscoveryConfig> for DiscoveryLimits {
    fn from(config: DiscoveryConfig) -> Self {
        DiscoveryLimits {
            max_depth: config.max_depth,
            max_candidates: config.max_candidates,
            max_array_prefix: config.max_array_prefix,
        }
    }
}

/// Default config file path (`<config dir>/stridex/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join("config.toml"))
}

/// Parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    toml::from_str(&content).map_err(|e| Error::Config(format!("Invalid config {}: {}", path.display(), e)))
}

/// Load the config file, falling back to defaults
///
/// `path` overrides the default location. A missing file is normal; an
/// unreadable or invalid one is logged and ignored.
pub fn load_config_or_default(path: Option<&Path>) -> TomlConfig {
    let Some(path) = path.map(Path::to_path_buf).or_else(default_config_path) else {
        debug!("No config directory on this platform, using defaults");
        return TomlConfig::default();
    };

    if !path.exists() {
        debug!(path = %path.display(), "Config file not found, using defaults");
        return TomlConfig::default();
    }

    match load_toml_config(&path) {
        Ok(config) => {
            info!(path = %path.display(), "Loaded config file");
            config
        }
        Err(e) => {
            warn!(error = %e, "Ignoring config file, using defaults");
            TomlConfig::default()
        }
    }
}

/// OS-dependent default data folder
pub fn default_data_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("./stridex_data"))
}

/// Resolves the data folder from CLI, environment, TOML and OS default
#[derive(Debug, Clone)]
pub struct DataFolderResolver {
    env_var: String,
    toml_folder: Option<PathBuf>,
}

impl DataFolderResolver {
    pub fn new(config: &TomlConfig) -> Self {
        Self {
            env_var: DATA_FOLDER_ENV.to_string(),
            toml_folder: config.data_folder.clone(),
        }
    }

    /// Use a different environment variable name
    pub fn with_env_var(mut self, name: &str) -> Self {
        self.env_var = name.to_string();
        self
    }

    pub fn resolve(&self, cli_arg: Option<&Path>) -> PathBuf {
        // Priority 1: Command-line argument
        if let Some(path) = cli_arg {
            debug!(path = %path.display(), "Data folder from command line");
            return path.to_path_buf();
        }

        // Priority 2: Environment variable (empty counts as unset)
        if let Ok(path) = std::env::var(&self.env_var) {
            if !path.trim().is_empty() {
                debug!(var = %self.env_var, "Data folder from environment");
                return PathBuf::from(path);
            }
        }

        // Priority 3: TOML config file
        if let Some(path) = &self.toml_folder {
            debug!("Data folder from config file");
            return path.clone();
        }

        // Priority 4: OS-dependent compiled default
        default_data_folder()
    }
}

/// Creates the data folder on first run
#[derive(Debug, Clone)]
pub struct DataFolderInitializer {
    folder: PathBuf,
}

impl DataFolderInitializer {
    pub fn new(folder: PathBuf) -> Self {
        Self { folder }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Create the folder (and parents) when missing; idempotent
    pub fn ensure_directory_exists(&self) -> Result<()> {
        if self.folder.is_dir() {
            return Ok(());
        }
        if self.folder.exists() {
            return Err(Error::Config(format!(
                "Data folder path is not a directory: {}",
                self.folder.display()
            )));
        }
        std::fs::create_dir_all(&self.folder)?;
        info!(path = %self.folder.display(), "Created data folder");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config: TomlConfig = toml::from_str("").unwrap();
        assert_eq!(config, TomlConfig::default());
        assert_eq!(config.port, 5740);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.discovery.max_depth, 12);
    }

    #[test]
    fn test_partial_sections() {
        let config: TomlConfig = toml::from_str(
            r#"
            port = 8080

            [logging]
            level = "debug"

            [discovery]
            max_candidates = 50
            "#,
        )
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.file.is_none());

        let limits = DiscoveryLimits::from(config.discovery);
        assert_eq!(limits.max_candidates, 50);
        assert_eq!(limits.max_depth, DEFAULT_MAX_DEPTH);
        assert_eq!(limits.max_array_prefix, DEFAULT_MAX_ARRAY_PREFIX);
    }

    #[test]
    fn test_default_paths_end_with_app_dir() {
        assert!(default_data_folder().ends_with(APP_DIR_NAME) || default_data_folder().ends_with("stridex_data"));
        if let Some(path) = default_config_path() {
            assert!(path.ends_with("stridex/config.toml"));
        }
    }
}
