//! Transaction access
//!
//! Read operations of every store accept either a read or a write
//! transaction, so lookups made inside a write transaction observe the
//! uncommitted changes of that same transaction.

use redb::{
    Key, ReadOnlyTable, ReadTransaction, ReadableTable, Table, TableDefinition, TableError,
    Value, WriteTransaction,
};

use crate::error::Result;

/// A transaction tables can be read through
pub trait ReadTxn {
    /// Table handle opened by this kind of transaction
    type Readable<'txn, K: Key + 'static, V: Value + 'static>: ReadableTable<K, V>
    where
        Self: 'txn;

    /// Open a table for reading.
    ///
    /// Returns `None` when the table was never created.
    fn open_readable<'txn, K: Key + 'static, V: Value + 'static>(
        &'txn self,
        definition: TableDefinition<'_, K, V>,
    ) -> Result<Option<Self::Readable<'txn, K, V>>>;
}

impl ReadTxn for ReadTransaction {
    type Readable<'txn, K: Key + 'static, V: Value + 'static> = ReadOnlyTable<K, V>
    where
        Self: 'txn;

    fn open_readable<'txn, K: Key + 'static, V: Value + 'static>(
        &'txn self,
        definition: TableDefinition<'_, K, V>,
    ) -> Result<Option<ReadOnlyTable<K, V>>> {
        match self.open_table(definition) {
            Ok(table) => Ok(Some(table)),
            Err(TableError::TableDoesNotExist(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl ReadTxn for WriteTransaction {
    type Readable<'txn, K: Key + 'static, V: Value + 'static> = Table<'txn, K, V>
    where
        Self: 'txn;

    fn open_readable<'txn, K: Key + 'static, V: Value + 'static>(
        &'txn self,
        definition: TableDefinition<'_, K, V>,
    ) -> Result<Option<Table<'txn, K, V>>> {
        Ok(Some(self.open_table(definition)?))
    }
}
