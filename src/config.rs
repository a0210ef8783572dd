//! Configuration for KeyTrie
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Default maximum size of a single key segment, in bytes
pub const DEFAULT_MAX_SEGMENT_SIZE: usize = 128;

/// Main configuration for a KeyTrie instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Path of the database file holding every table
    /// (free extents, index nodes, index metadata, payloads)
    pub db_path: PathBuf,

    /// Page cache handed to the host store (in bytes)
    pub cache_size: usize,

    // -------------------------------------------------------------------------
    // Index Configuration
    // -------------------------------------------------------------------------
    /// Max length of a chopped key segment.
    /// Fixed for the lifetime of a database: reopening with a different value
    /// is rejected.
    pub max_segment_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./keytrie_data/keytrie.redb"),
            cache_size: 64 * 1024 * 1024, // 64 MB
            max_segment_size: DEFAULT_MAX_SEGMENT_SIZE,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the database file path
    pub fn db_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.db_path = path.into();
        self
    }

    /// Set the host store cache size (in bytes)
    pub fn cache_size(mut self, size: usize) -> Self {
        self.config.cache_size = size;
        self
    }

    /// Set the maximum key segment size (in bytes)
    pub fn max_segment_size(mut self, size: usize) -> Self {
        self.config.max_segment_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
