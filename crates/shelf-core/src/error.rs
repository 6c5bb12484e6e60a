//! Error types for shelftalk

use thiserror::Error;

/// Main error type for shelftalk
#[derive(Debug, Error)]
pub enum ShelfError {
    /// Missing or out-of-range input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Inactive/unknown member, or a member acting on someone else's comment
    #[error("Authorization error: {0}")]
    Authorization(String),

    /// Referenced thread, comment or member does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// State transition that cannot be applied idempotently
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Store failure
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ShelfError>,
    },
}

/// Coarse error classification surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    Authorization,
    NotFound,
    Conflict,
    Internal,
}

impl ShelfError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ShelfError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Classify the error; wrapped errors report the kind of their source
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShelfError::Validation(_) => ErrorKind::Validation,
            ShelfError::Authorization(_) => ErrorKind::Authorization,
            ShelfError::NotFound(_) => ErrorKind::NotFound,
            ShelfError::Conflict(_) => ErrorKind::Conflict,
            ShelfError::WithContext { source, .. } => source.kind(),
            ShelfError::Internal(_)
            | ShelfError::Io(_)
            | ShelfError::Serde(_)
            | ShelfError::Toml(_)
            | ShelfError::Config(_) => ErrorKind::Internal,
        }
    }

    /// Shorthand for store failures
    pub fn internal(message: impl Into<String>) -> Self {
        ShelfError::Internal(message.into())
    }
}

impl From<toml::de::Error> for ShelfError {
    fn from(err: toml::de::Error) -> Self {
        ShelfError::Toml(err.to_string())
    }
}

impl From<toml::ser::Error> for ShelfError {
    fn from(err: toml::ser::Error) -> Self {
        ShelfError::Toml(err.to_string())
    }
}

/// Result type alias for shelftalk
pub type Result<T> = std::result::Result<T, ShelfError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ShelfError::NotFound("thread 12".to_string());
        assert_eq!(err.to_string(), "Not found: thread 12");
    }

    #[test]
    fn test_error_with_context() {
        let err = ShelfError::Validation("content too short".to_string());
        let err = err.with_context("Failed to add comment");
        assert!(err.to_string().contains("Failed to add comment"));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_ambient_errors_are_internal() {
        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err: ShelfError = io_err.into();
        assert!(matches!(err, ShelfError::Io(_)));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert_eq!(ShelfError::Config("bad".into()).kind(), ErrorKind::Internal);
    }
}
