//! Comment content validation

use crate::config::ContentConfig;
use crate::error::{Result, ShelfError};

/// Minimum comment length (default)
pub const MIN_COMMENT_LENGTH: usize = 10;

/// Maximum comment length (default)
pub const MAX_COMMENT_LENGTH: usize = 300;

/// Validator for comment and reply content
#[derive(Debug, Clone, Copy)]
pub struct ContentValidator {
    min_length: usize,
    max_length: usize,
}

impl ContentValidator {
    /// Create a new validator with default settings
    pub fn new() -> Self {
        Self {
            min_length: MIN_COMMENT_LENGTH,
            max_length: MAX_COMMENT_LENGTH,
        }
    }

    /// Create a validator from configuration
    pub fn from_config(config: &ContentConfig) -> Self {
        Self {
            min_length: config.min_length,
            max_length: config.max_length,
        }
    }

    /// Validate content. Length is counted in characters, not bytes, and
    /// surrounding whitespace counts.
    pub fn validate_content(&self, content: &str) -> Result<()> {
        if content.trim().is_empty() {
            return Err(ShelfError::Validation(
                "Comment content is required".to_string(),
            ));
        }

        let length = content.chars().count();

        if length < self.min_length {
            return Err(ShelfError::Validation(format!(
                "Comment content must be at least {} characters (got {})",
                self.min_length, length
            )));
        }

        if length > self.max_length {
            return Err(ShelfError::Validation(format!(
                "Comment content must be at most {} characters (got {})",
                self.max_length, length
            )));
        }

        Ok(())
    }
}

impl Default for ContentValidator {
    fn default() -> Self {
        Self::new()
    }
}
