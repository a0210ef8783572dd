//! Engine Module
//!
//! Opens the host database and wires the stores together.
//!
//! ## Responsibilities
//! - Create the database file (and its directory) on first open
//! - Open the allocator, index and payload stores
//! - Hand out read/write transactions
//! - Report table statistics
//!
//! The engine adds no locking of its own: redb serializes write transactions
//! and gives every read transaction a consistent snapshot.

use std::fs;
use std::path::Path;

use redb::{Builder, Database, ReadTransaction, WriteTransaction};
use tracing::info;

use crate::allocator::IdAllocator;
use crate::config::Config;
use crate::data::DataStore;
use crate::error::Result;
use crate::index::IndexStore;
use crate::txn::ReadTxn;

/// Table statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    /// Number of free extents
    pub free_extents: u64,

    /// Number of ids not currently allocated
    pub free_ids: u64,

    /// Number of trie nodes
    pub index_nodes: u64,

    /// Number of stored payloads
    pub payloads: u64,
}

/// The KeyTrie engine
///
/// Callers open a transaction, run allocator/index/data operations inside
/// it, then commit:
///
/// ```no_run
/// # fn main() -> keytrie::Result<()> {
/// let engine = keytrie::Engine::open_path("./data/keytrie.redb")?;
/// let txn = engine.begin_write()?;
/// let id = engine.allocator().allocate_one(&txn)?;
/// engine.index().set(&txn, b"users/alice", b"profile")?;
/// txn.commit()?;
/// # let _ = id;
/// # Ok(())
/// # }
/// ```
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Host store holding every table
    db: Database,

    /// Id space shared by callers and the index
    allocator: IdAllocator,

    /// Composite-key trie
    index: IndexStore,

    /// Id → bytes payloads
    data: DataStore,
}

impl Engine {
    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Create the database directory if needed
    /// 2. Open/create the database file
    /// 3. Open the allocator (seeding the id space on first open)
    /// 4. Open the index and payload stores
    pub fn open(config: Config) -> Result<Self> {
        // Step 1: Create data directory if it doesn't exist
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        // Step 2: Open the host store
        let db = Builder::new()
            .set_cache_size(config.cache_size)
            .create(&config.db_path)?;

        // Step 3: Allocator first, the index mints node ids from it
        let allocator = IdAllocator::open(&db)?;

        // Step 4: Index and payload stores
        let index = IndexStore::open(&db, allocator, config.max_segment_size)?;
        let data = DataStore::open(&db)?;

        info!(
            path = %config.db_path.display(),
            max_segment_size = config.max_segment_size,
            "Engine opened"
        );

        Ok(Self {
            config,
            db,
            allocator,
            index,
            data,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified database file
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let config = Config::builder().db_path(path.as_ref()).build();
        Self::open(config)
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> Result<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    /// Begin a read transaction
    pub fn begin_read(&self) -> Result<ReadTransaction> {
        Ok(self.db.begin_read()?)
    }

    /// Collect table statistics
    pub fn stats(&self, txn: &impl ReadTxn) -> Result<Stats> {
        Ok(Stats {
            free_extents: self.allocator.free_extent_count(txn)?,
            free_ids: self.allocator.free_id_count(txn)?,
            index_nodes: self.index.node_count(txn)?,
            payloads: self.data.count(txn)?,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Get the id allocator
    pub fn allocator(&self) -> &IdAllocator {
        &self.allocator
    }

    /// Get the index store
    pub fn index(&self) -> &IndexStore {
        &self.index
    }

    /// Get the payload store
    pub fn data(&self) -> &DataStore {
        &self.data
    }

    /// Get the underlying database
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
