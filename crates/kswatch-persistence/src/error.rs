//! Persistence error types

use thiserror::Error;

/// Errors that can occur during document storage operations
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Underlying filesystem failure
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Deserialization error: {0}")]
    Deserialization(String),

    /// Key cannot be mapped onto the backend
    #[error("Invalid document key: {0}")]
    InvalidKey(String),

    /// Backend-specific failure
    #[error("Backend error: {0}")]
    Backend(String),
}

impl PersistenceError {
    pub fn invalid_key(key: impl Into<String>) -> Self {
        Self::InvalidKey(key.into())
    }
}

/// Result type for persistence operations
pub type Result<T> = std::result::Result<T, PersistenceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_key_message() {
        let err = PersistenceError::invalid_key("");
        assert_eq!(err.to_string(), "Invalid document key: ");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: PersistenceError = io.into();
        assert!(matches!(err, PersistenceError::Io(_)));
    }
}
