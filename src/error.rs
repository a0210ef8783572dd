//! Error types for KeyTrie
//!
//! Provides a unified error type for all operations.
//!
//! Ordinary absence (unknown key, unknown id, exhausted id space on a plain
//! allocation) is never an error: those are reported through `Option`/`bool`
//! results. Only contract violations and host-store failures end up here.

use thiserror::Error;

/// Result type alias using KeyTrieError
pub type Result<T> = std::result::Result<T, KeyTrieError>;

/// Unified error type for KeyTrie operations
#[derive(Debug, Error)]
pub enum KeyTrieError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Host Store Errors (redb)
    // -------------------------------------------------------------------------
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    // -------------------------------------------------------------------------
    // Allocator Errors
    // -------------------------------------------------------------------------
    #[error("Invalid length: extents must cover at least one id")]
    InvalidLength,

    #[error("Invalid range: [{start}, {start} + {length}) leaves the id space")]
    InvalidRange { start: u64, length: u64 },

    #[error(
        "Double free: [{start}, {start} + {length}) overlaps free extent \
         [{free_start}, {free_start} + {free_length})"
    )]
    DoubleFree {
        start: u64,
        length: u64,
        free_start: u64,
        free_length: u64,
    },

    #[error("Id space exhausted")]
    IdSpaceExhausted,

    // -------------------------------------------------------------------------
    // Index Errors
    // -------------------------------------------------------------------------
    #[error("Corruption detected: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<bincode::Error> for KeyTrieError {
    fn from(err: bincode::Error) -> Self {
        KeyTrieError::Serialization(err.to_string())
    }
}
