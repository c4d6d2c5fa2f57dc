//! Core configuration types

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct AppConfig {
    pub detector: DetectorConfig,
    pub persistence: PersistenceConfig,
    pub logging: LoggingConfig,
}

/// Confidence level of the two-sample KS test.
///
/// Each level is bound to the critical coefficient `c(α)` used in
/// `c · sqrt((n + m) / (n · m))`. Serialized as its level code `0..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Confidence {
    /// α = 0.10
    P10,
    /// α = 0.05
    #[default]
    P05,
    /// α = 0.025
    P025,
    /// α = 0.01
    P01,
    /// α = 0.005
    P005,
    /// α = 0.001
    P001,
}

impl Confidence {
    pub const ALL: [Confidence; 6] = [
        Confidence::P10,
        Confidence::P05,
        Confidence::P025,
        Confidence::P01,
        Confidence::P005,
        Confidence::P001,
    ];

    /// Level code as written in configuration files
    pub fn level(self) -> u8 {
        match self {
            Confidence::P10 => 0,
            Confidence::P05 => 1,
            Confidence::P025 => 2,
            Confidence::P01 => 3,
            Confidence::P005 => 4,
            Confidence::P001 => 5,
        }
    }

    /// Two-sided significance level α
    pub fn significance(self) -> f64 {
        match self {
            Confidence::P10 => 0.10,
            Confidence::P05 => 0.05,
            Confidence::P025 => 0.025,
            Confidence::P01 => 0.01,
            Confidence::P005 => 0.005,
            Confidence::P001 => 0.001,
        }
    }

    /// Critical coefficient c(α)
    pub fn coefficient(self) -> f64 {
        match self {
            Confidence::P10 => 1.22,
            Confidence::P05 => 1.36,
            Confidence::P025 => 1.48,
            Confidence::P01 => 1.63,
            Confidence::P005 => 1.73,
            Confidence::P001 => 1.95,
        }
    }
}

impl TryFrom<u8> for Confidence {
    type Error = ConfigError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Confidence::ALL
            .into_iter()
            .find(|c| c.level() == level)
            .ok_or_else(|| {
                ConfigError::Validation(format!(
                    "confidence level must be between 0 and 5, got {}",
                    level
                ))
            })
    }
}

impl From<Confidence> for u8 {
    fn from(confidence: Confidence) -> Self {
        confidence.level()
    }
}

/// How the KS distance between two samples is computed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMethod {
    /// Exact sup-distance over the merged support, ties grouped
    #[default]
    Exact,
    /// Single-cursor merge scan that stops once the second sample runs out
    MergeScan,
}

/// What to do with an unmatched window when a metric is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityPolicy {
    /// Replace the least observed fingerprint
    #[default]
    ReplaceWeakest,
    /// Keep the existing fingerprints and drop the new shape
    Discard,
}

/// Detector tuning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectorConfig {
    pub confidence: Confidence,
    /// Matches a fingerprint needs before its shape counts as normal
    pub normal_count: u64,
    /// Upper bound on fingerprints kept per metric
    pub max_fingerprints: usize,
    pub distance_method: DistanceMethod,
    pub capacity_policy: CapacityPolicy,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            confidence: Confidence::default(),
            normal_count: 3,
            max_fingerprints: 20,
            distance_method: DistanceMethod::default(),
            capacity_policy: CapacityPolicy::default(),
        }
    }
}

/// Document backend selection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageBackend {
    #[default]
    Memory,
    Disk {
        path: PathBuf,
    },
}

/// Persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct PersistenceConfig {
    pub backend: StorageBackend,
    /// Background save interval; `None` leaves saving to the host
    pub autosave_secs: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level: trace, debug, info, warn or error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Configuration manager trait
pub trait ConfigManager {
    /// Load configuration
    fn load_config(&mut self) -> Result<AppConfig, ConfigError>;
    /// Save configuration
    fn save_config(&self, config: &AppConfig) -> Result<(), ConfigError>;
    /// Validate configuration
    fn validate_config(&self, config: &AppConfig) -> Result<(), ConfigError>;
}
