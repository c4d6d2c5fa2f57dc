//! Configuration manager implementation

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use kswatch_common::LogLevel;

use crate::{
    error::{ConfigError, Result},
    types::{AppConfig, ConfigManager as ConfigManagerTrait, StorageBackend},
};

/// Loads [`AppConfig`] from a TOML file overridden by `KSWATCH__*` variables
pub struct ConfigManager {
    config_path: PathBuf,
    env_prefix: String,
}

impl ConfigManager {
    /// Create a new configuration manager
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
            env_prefix: "KSWATCH".to_string(),
        }
    }

    /// Create with custom config path
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            config_path: path,
            env_prefix: "KSWATCH".to_string(),
        }
    }

    /// Override the environment prefix
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kswatch")
            .join("config.toml")
    }
}

impl ConfigManagerTrait for ConfigManager {
    fn load_config(&mut self) -> Result<AppConfig> {
        let builder = Config::builder()
            .add_source(File::from(self.config_path.clone()).required(false))
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        let app_config: AppConfig = builder.build()?.try_deserialize()?;
        self.validate_config(&app_config)?;
        tracing::debug!(path = %self.config_path.display(), "Loaded configuration");
        Ok(app_config)
    }

    fn save_config(&self, config: &AppConfig) -> Result<()> {
        let toml = toml::to_string(config)?;
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.config_path, toml)?;
        Ok(())
    }

    fn validate_config(&self, config: &AppConfig) -> Result<()> {
        if config.detector.max_fingerprints == 0 {
            return Err(ConfigError::Validation(
                "max_fingerprints must be greater than 0".to_string(),
            ));
        }
        if config.persistence.autosave_secs == Some(0) {
            return Err(ConfigError::Validation(
                "autosave_secs must be greater than 0 when set".to_string(),
            ));
        }
        if let StorageBackend::Disk { path } = &config.persistence.backend {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::Validation(
                    "disk backend requires a path".to_string(),
                ));
            }
        }
        config
            .logging
            .level
            .parse::<LogLevel>()
            .map_err(|e| ConfigError::Validation(e.to_string()))?;
        Ok(())
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
