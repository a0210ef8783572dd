//! Payload store implementation

use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition, WriteTransaction};
use tracing::debug;

use crate::error::Result;
use crate::txn::ReadTxn;

/// Payloads: id → bytes
pub const PAYLOADS: TableDefinition<u64, &[u8]> = TableDefinition::new("payloads");

/// Id → bytes store
#[derive(Debug, Clone, Copy)]
pub struct DataStore {
    _private: (),
}

impl DataStore {
    /// Open or create the payload table
    pub fn open(db: &Database) -> Result<Self> {
        let txn = db.begin_write()?;
        txn.open_table(PAYLOADS)?;
        txn.commit()?;

        Ok(Self { _private: () })
    }

    /// Check whether data is stored under `id`
    pub fn exists(&self, txn: &impl ReadTxn, id: u64) -> Result<bool> {
        match txn.open_readable(PAYLOADS)? {
            Some(table) => Ok(table.get(id)?.is_some()),
            None => Ok(false),
        }
    }

    /// Get the data stored under `id`
    pub fn get(&self, txn: &impl ReadTxn, id: u64) -> Result<Option<Vec<u8>>> {
        match txn.open_readable(PAYLOADS)? {
            Some(table) => Ok(table.get(id)?.map(|value| value.value().to_vec())),
            None => Ok(None),
        }
    }

    /// Store `data` under `id`, replacing any previous data
    pub fn set(&self, txn: &WriteTransaction, id: u64, data: &[u8]) -> Result<()> {
        let mut table = txn.open_table(PAYLOADS)?;
        table.insert(id, data)?;
        debug!(id, len = data.len(), "Stored payload");
        Ok(())
    }

    /// Delete the data stored under `id`
    ///
    /// Returns whether anything was stored.
    pub fn delete(&self, txn: &WriteTransaction, id: u64) -> Result<bool> {
        let mut table = txn.open_table(PAYLOADS)?;
        let existed = table.remove(id)?.is_some();
        if existed {
            debug!(id, "Deleted payload");
        }
        Ok(existed)
    }

    /// Number of stored payloads
    pub fn count(&self, txn: &impl ReadTxn) -> Result<u64> {
        match txn.open_readable(PAYLOADS)? {
            Some(table) => Ok(table.len()?),
            None => Ok(0),
        }
    }
}
