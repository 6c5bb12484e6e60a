//! Configuration management for shelftalk

use crate::error::{Result, ShelfError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Comment content rules
    pub content: ContentConfig,
    /// Page sizes
    pub pagination: PaginationConfig,
    /// Reconciliation sweep settings
    pub reconcile: ReconcileConfig,
    /// Database settings
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from a TOML file, falling back to defaults if it is absent
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path).map_err(|e| {
            ShelfError::from(e).with_context(format!("Failed to read {}", path.display()))
        })?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| ShelfError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Render as TOML
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<()> {
        if self.content.min_length > self.content.max_length {
            return Err(ShelfError::Config(format!(
                "content.min_length ({}) exceeds content.max_length ({})",
                self.content.min_length, self.content.max_length
            )));
        }
        if self.pagination.max_page_size == 0 {
            return Err(ShelfError::Config(
                "pagination.max_page_size must be positive".to_string(),
            ));
        }
        if self.reconcile.batch_size == 0 {
            return Err(ShelfError::Config(
                "reconcile.batch_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Comment content rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// Minimum content length in characters
    pub min_length: usize,
    /// Maximum content length in characters
    pub max_length: usize,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            min_length: 10,
            max_length: 300,
        }
    }
}

/// Page sizes used when a caller omits or garbles the limit
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationConfig {
    /// Threads per page
    pub thread_page_size: u64,
    /// Parent comments per page
    pub comment_page_size: u64,
    /// Upper bound on any requested limit
    pub max_page_size: u64,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            thread_page_size: 6,
            comment_page_size: 5,
            max_page_size: 100,
        }
    }
}

/// Reconciliation sweep settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconcileConfig {
    /// Rows removed per unit of work
    pub batch_size: usize,
    /// Interval between scheduled sweeps in seconds
    pub interval_secs: u64,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            batch_size: 500,
            interval_secs: 3600,
        }
    }
}

/// Database settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database path; the platform data directory is used when unset
    pub database: Option<PathBuf>,
}
