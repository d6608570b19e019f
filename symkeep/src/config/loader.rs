//! Configuration file discovery and loading.
//!
//! This module handles discovering and loading symkeep configuration files
//! from various locations with proper precedence.

use crate::config::schema::Config;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the global configuration file inside the data directory.
pub const GLOBAL_CONFIG_FILE: &str = "config.yaml";

/// Name of a directory-level configuration file.
pub const DIRECTORY_CONFIG_FILE: &str = ".symkeep.yaml";

/// Configuration source with its precedence level.
///
/// Lower precedence values are overridden by higher ones.
///
/// # Examples
///
/// ```
/// use symkeep::config::ConfigSource;
/// use std::path::PathBuf;
///
/// // Global config has lowest precedence
/// let global = ConfigSource {
///     path: PathBuf::from("~/.symkeep/config.yaml"),
///     precedence: 1,
///     config: Default::default(),
/// };
/// ```
#[derive(Debug, Clone)]
pub struct ConfigSource {
    /// Path to the configuration file.
    pub path: PathBuf,
    /// Precedence level (higher values take priority).
    pub precedence: u8,
    /// Parsed configuration.
    pub config: Config,
}

/// The default data directory, `~/.symkeep`.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined.
pub fn default_data_dir() -> Result<PathBuf> {
    home::home_dir()
        .map(|home| home.join(".symkeep"))
        .ok_or_else(|| Error::NotFound {
            resource: "home directory".to_string(),
        })
}

/// Loads configuration from various sources.
///
/// # Examples
///
/// ```no_run
/// use symkeep::config::ConfigLoader;
/// use std::path::Path;
///
/// let sources = ConfigLoader::load_all(Path::new("."), None).unwrap();
/// println!("Found {} configuration sources", sources.len());
/// ```
pub struct ConfigLoader;

impl ConfigLoader {
    /// Discover and load all configuration files.
    ///
    /// Searches for:
    /// 1. Global config at `~/.symkeep/config.yaml` (precedence 1)
    /// 2. The nearest `.symkeep.yaml` walking up from `working_dir` (precedence 2)
    ///
    /// The `data_dir` parameter allows overriding where the global config is loaded from.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration file exists but cannot be read
    /// or parsed.
    pub fn load_all(working_dir: &Path, data_dir: Option<&Path>) -> Result<Vec<ConfigSource>> {
        let mut sources = Vec::new();

        if let Some(global) = Self::load_global_config(data_dir)? {
            sources.push(global);
        }

        if let Some(directory) = Self::discover_directory_config(working_dir)? {
            sources.push(directory);
        }

        sources.sort_by_key(|s| s.precedence);

        Ok(sources)
    }

    /// Path of the global configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if no `data_dir` is given and the home directory
    /// cannot be determined.
    pub fn global_config_path(data_dir: Option<&Path>) -> Result<PathBuf> {
        match data_dir {
            Some(dir) => Ok(dir.join(GLOBAL_CONFIG_FILE)),
            None => Ok(default_data_dir()?.join(GLOBAL_CONFIG_FILE)),
        }
    }

    /// Load the global configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    fn load_global_config(data_dir: Option<&Path>) -> Result<Option<ConfigSource>> {
        let config_path = Self::global_config_path(data_dir)?;

        if !config_path.exists() {
            return Ok(None);
        }

        let config = Self::load_file(&config_path)?;
        Ok(Some(ConfigSource {
            path: config_path,
            precedence: 1,
            config,
        }))
    }

    /// Find the nearest directory configuration by walking up directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the discovered file cannot be read or parsed.
    pub fn discover_directory_config(start_dir: &Path) -> Result<Option<ConfigSource>> {
        let mut current = start_dir.to_path_buf();

        loop {
            let candidate = current.join(DIRECTORY_CONFIG_FILE);
            if candidate.is_file() {
                let config = Self::load_file(&candidate)?;
                log::debug!("using directory config {}", candidate.display());
                return Ok(Some(ConfigSource {
                    path: candidate,
                    precedence: 2,
                    config,
                }));
            }

            if !current.pop() {
                return Ok(None);
            }
        }
    }

    /// Load and parse a YAML configuration file.
    ///
    /// An empty file is an empty configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the YAML is invalid.
    pub fn load_file(path: &Path) -> Result<Config> {
        let contents = fs::read_to_string(path).map_err(|e| Error::InvalidPath {
            path: path.to_path_buf(),
            reason: format!("Failed to read configuration file: {e}"),
        })?;

        if contents.trim().is_empty() {
            return Ok(Config::default());
        }

        serde_yaml::from_str(&contents).map_err(|e| Error::Validation {
            field: format!("{}", path.display()),
            message: format!("Invalid YAML: {e}"),
        })
    }

    /// Write `config` to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn save_file(path: &Path, config: &Config) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let yaml = if config.is_empty() {
            String::new()
        } else {
            serde_yaml::to_string(config)?
        };
        fs::write(path, yaml)?;
        Ok(())
    }
}
