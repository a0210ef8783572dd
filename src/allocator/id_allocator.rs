//! Id allocator implementation
//!
//! Greedy, lowest-address-first allocation over the free-extent table.

use redb::{
    Database, ReadableTable, ReadableTableMetadata, TableDefinition, TableError,
    WriteTransaction,
};
use tracing::{debug, info, warn};

use crate::error::{KeyTrieError, Result};
use crate::txn::ReadTxn;

use super::{Extent, FULL_RANGE_LENGTH};

/// Free extents: start id → length
pub const FREE_EXTENTS: TableDefinition<u64, u64> = TableDefinition::new("free_extents");

/// Allocates and frees ids from the free-extent table
///
/// Holds no state of its own: every operation runs inside the caller's
/// transaction, and the table is opened for the duration of the call.
#[derive(Debug, Clone, Copy)]
pub struct IdAllocator {
    _private: (),
}

impl IdAllocator {
    /// Open the allocator, creating and seeding the free table if absent
    ///
    /// An existing empty table means every id is in use and is left as is.
    pub fn open(db: &Database) -> Result<Self> {
        let allocator = Self { _private: () };

        let exists = {
            let txn = db.begin_read()?;
            match txn.open_table(FREE_EXTENTS) {
                Ok(_) => true,
                Err(TableError::TableDoesNotExist(_)) => false,
                Err(e) => return Err(e.into()),
            }
        };

        if !exists {
            let txn = db.begin_write()?;
            {
                let mut table = txn.open_table(FREE_EXTENTS)?;
                table.insert(0u64, FULL_RANGE_LENGTH)?;
            }
            txn.commit()?;
            info!(length = FULL_RANGE_LENGTH, "Seeded free extent table");
        }

        Ok(allocator)
    }

    /// Allocate up to `requested` contiguous ids
    ///
    /// The grant comes from the lowest free extent and is never split across
    /// extents: if that extent is shorter than `requested`, the whole extent
    /// is granted and the caller must ask again for the rest.
    ///
    /// Returns:
    /// - `Ok(Some(extent))` — the granted range, `1 ..= requested` ids long
    /// - `Ok(None)` — the id space is exhausted
    pub fn allocate(&self, txn: &WriteTransaction, requested: u64) -> Result<Option<Extent>> {
        if requested == 0 {
            return Err(KeyTrieError::InvalidLength);
        }

        let mut table = txn.open_table(FREE_EXTENTS)?;

        let first = match table.pop_first()? {
            Some((start, length)) => Extent::new(start.value(), length.value()),
            None => {
                debug!(requested, "Id space exhausted");
                return Ok(None);
            }
        };

        let granted = requested.min(first.length);
        if granted < first.length {
            table.insert(first.start + granted, first.length - granted)?;
        }

        let extent = Extent::new(first.start, granted);
        debug!(%extent, requested, "Allocated ids");
        Ok(Some(extent))
    }

    /// Allocate a single id
    pub fn allocate_one(&self, txn: &WriteTransaction) -> Result<Option<u64>> {
        Ok(self.allocate(txn, 1)?.map(|extent| extent.start))
    }

    /// Return `[start, start + length)` to the free table
    ///
    /// The range is merged with the free extent ending at `start` and the one
    /// beginning at `start + length`, when present. A range overlapping any
    /// free extent is a double free: it is refused with
    /// [`KeyTrieError::DoubleFree`] and the table is left unchanged.
    pub fn free(&self, txn: &WriteTransaction, start: u64, length: u64) -> Result<()> {
        let freed = Extent::checked(start, length)?;

        let mut table = txn.open_table(FREE_EXTENTS)?;
        let (before, after) = neighbours(&table, start)?;

        // Validate both neighbours before mutating anything
        for neighbour in before.iter().chain(after.iter()) {
            if neighbour.overlaps(&freed) {
                warn!(%freed, free = %neighbour, "Refusing double free");
                return Err(KeyTrieError::DoubleFree {
                    start,
                    length,
                    free_start: neighbour.start,
                    free_length: neighbour.length,
                });
            }
        }

        let mut merged = freed;

        if let Some(prev) = before.filter(|prev| prev.precedes(&freed)) {
            table.remove(prev.start)?;
            merged = Extent::new(prev.start, prev.length + merged.length);
        }

        if let Some(next) = after.filter(|next| freed.precedes(next)) {
            table.remove(next.start)?;
            merged.length += next.length;
        }

        table.insert(merged.start, merged.length)?;
        debug!(%freed, %merged, "Freed ids");
        Ok(())
    }

    /// Free a single id
    pub fn free_one(&self, txn: &WriteTransaction, id: u64) -> Result<()> {
        self.free(txn, id, 1)
    }

    /// All free extents in ascending order of start
    pub fn free_extents(&self, txn: &impl ReadTxn) -> Result<Vec<Extent>> {
        let table = match txn.open_readable(FREE_EXTENTS)? {
            Some(table) => table,
            None => return Ok(Vec::new()),
        };

        let mut extents = Vec::new();
        for entry in table.iter()? {
            let (start, length) = entry?;
            extents.push(Extent::new(start.value(), length.value()));
        }
        Ok(extents)
    }

    /// Number of free extents
    pub fn free_extent_count(&self, txn: &impl ReadTxn) -> Result<u64> {
        match txn.open_readable(FREE_EXTENTS)? {
            Some(table) => Ok(table.len()?),
            None => Ok(0),
        }
    }

    /// Number of ids not currently allocated
    pub fn free_id_count(&self, txn: &impl ReadTxn) -> Result<u64> {
        Ok(self
            .free_extents(txn)?
            .iter()
            .map(|extent| extent.length)
            .sum())
    }
}

/// The free extents adjacent to `start`: the last one starting before it, and
/// the first one starting at or after it
///
/// With no extent at or after `start`, the cursor falls back to the last
/// extent of the table, which then becomes the only merge candidate.
fn neighbours<T>(table: &T, start: u64) -> Result<(Option<Extent>, Option<Extent>)>
where
    T: ReadableTable<u64, u64>,
{
    let after = match table.range(start..)?.next() {
        Some(entry) => {
            let (key, value) = entry?;
            Some(Extent::new(key.value(), value.value()))
        }
        None => None,
    };

    let before = match after {
        Some(next) => match table.range(..next.start)?.next_back() {
            Some(entry) => {
                let (key, value) = entry?;
                Some(Extent::new(key.value(), value.value()))
            }
            None => None,
        },
        None => table
            .last()?
            .map(|(key, value)| Extent::new(key.value(), value.value())),
    };

    Ok((before, after))
}
