//! kswatch configuration
//!
//! Typed configuration for the detector, its persistence backend and
//! logging, loaded from an optional TOML file layered under `KSWATCH__*`
//! environment variables.

pub mod error;
pub mod manager;
pub mod types;

pub use error::{ConfigError, Result};
pub use manager::ConfigManager;
pub use types::{
    AppConfig, CapacityPolicy, Confidence, ConfigManager as ConfigManagerTrait, DetectorConfig,
    DistanceMethod, LoggingConfig, PersistenceConfig, StorageBackend,
};
