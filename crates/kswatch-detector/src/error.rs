//! Detector error types

use thiserror::Error;

/// Failure reported by a [`SampleReader`](crate::SampleReader)
#[derive(Debug, Error)]
#[error("sample read failed: {message}")]
pub struct ReaderError {
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl ReaderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Errors surfaced by the detector API
#[derive(Debug, Error)]
pub enum DetectorError {
    /// The host did not provide a required collaborator
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    #[error("invalid detector configuration: {0}")]
    InvalidConfig(String),

    /// The sample reader failed; no verdict was produced
    #[error(transparent)]
    Reader(#[from] ReaderError),
}

/// Result type for detector operations
pub type Result<T> = std::result::Result<T, DetectorError>;
