//! Index store implementation
//!
//! Every operation walks the chopped key from the root, one node lookup per
//! segment, inside the caller's transaction.

use redb::{Database, ReadableTable, ReadableTableMetadata, TableDefinition, WriteTransaction};
use tracing::{debug, info, warn};

use crate::allocator::IdAllocator;
use crate::codec::{NodeKey, NodeRecord};
use crate::error::{KeyTrieError, Result};
use crate::txn::ReadTxn;

use super::{chop, IndexNode, SENTINEL_ROOT};

/// Trie nodes: (parent id, segment) → encoded node record
pub const INDEX_NODES: TableDefinition<NodeKey, &[u8]> = TableDefinition::new("index_nodes");

/// Index settings fixed at creation time
pub const INDEX_META: TableDefinition<&str, u64> = TableDefinition::new("index_meta");

const META_MAX_SEGMENT_SIZE: &str = "max_segment_size";

/// Nodes along a stored key, root first
type NodePath = Vec<(NodeKey, NodeRecord)>;

/// Composite-key index over the trie node table
#[derive(Debug, Clone)]
pub struct IndexStore {
    /// Mints node ids and takes them back
    allocator: IdAllocator,

    /// Max bytes per chopped segment
    max_segment_size: usize,
}

impl IndexStore {
    /// Open or create the index store
    ///
    /// The segment size is recorded on first open; reopening with a different
    /// size fails, since existing keys could no longer be found.
    pub fn open(db: &Database, allocator: IdAllocator, max_segment_size: usize) -> Result<Self> {
        if max_segment_size == 0 {
            return Err(KeyTrieError::Config(
                "max_segment_size must be at least 1".to_string(),
            ));
        }

        let txn = db.begin_write()?;
        {
            txn.open_table(INDEX_NODES)?;

            let mut meta = txn.open_table(INDEX_META)?;
            let stored = meta.get(META_MAX_SEGMENT_SIZE)?.map(|v| v.value());
            match stored {
                None => {
                    meta.insert(META_MAX_SEGMENT_SIZE, max_segment_size as u64)?;
                    info!(max_segment_size, "Created index store");
                }
                Some(size) if size == max_segment_size as u64 => {}
                Some(size) => {
                    return Err(KeyTrieError::Config(format!(
                        "index was created with max_segment_size {}, opened with {}",
                        size, max_segment_size
                    )));
                }
            }
        }
        txn.commit()?;

        Ok(Self {
            allocator,
            max_segment_size,
        })
    }

    /// Max bytes per key segment
    pub fn max_segment_size(&self) -> usize {
        self.max_segment_size
    }

    /// Check whether `key` is stored
    ///
    /// A key that only exists as the prefix of longer keys is not stored.
    pub fn exists(&self, txn: &impl ReadTxn, key: &[u8]) -> Result<bool> {
        let table = match txn.open_readable(INDEX_NODES)? {
            Some(table) => table,
            None => return Ok(false),
        };
        Ok(locate(&table, &chop(key, self.max_segment_size))?.is_some())
    }

    /// Get the payload stored under `key`
    pub fn get(&self, txn: &impl ReadTxn, key: &[u8]) -> Result<Option<Vec<u8>>> {
        let table = match txn.open_readable(INDEX_NODES)? {
            Some(table) => table,
            None => return Ok(None),
        };

        let path = match locate(&table, &chop(key, self.max_segment_size))? {
            Some(path) => path,
            None => return Ok(None),
        };

        match path.into_iter().last() {
            Some((_, record)) => Ok(record.payload),
            None => Ok(None),
        }
    }

    /// Store `payload` under `key`
    ///
    /// Missing nodes on the path are created with a fresh id, existing ones
    /// gain a reference. Storing a key that is already present only replaces
    /// its payload.
    ///
    /// Fails with [`KeyTrieError::IdSpaceExhausted`] when a node id cannot be
    /// minted; the transaction must then be aborted, as nodes earlier on the
    /// path may already have been updated.
    pub fn set(&self, txn: &WriteTransaction, key: &[u8], payload: &[u8]) -> Result<()> {
        let segments = chop(key, self.max_segment_size);
        let mut table = txn.open_table(INDEX_NODES)?;

        if let Some(path) = locate(&table, &segments)? {
            if let Some((node_key, mut record)) = path.into_iter().last() {
                record.set_leaf(payload.to_vec());
                table.insert(&node_key, record.encode()?.as_slice())?;
                debug!(node = record.id, "Replaced index payload");
                return Ok(());
            }
        }

        let last = segments.len() - 1;
        let mut parent_id = SENTINEL_ROOT;

        for (i, segment) in segments.into_iter().enumerate() {
            let node_key = NodeKey::new(parent_id, segment);
            let existing = match table.get(&node_key)? {
                Some(value) => Some(NodeRecord::decode(value.value())?),
                None => None,
            };

            let record = match existing {
                Some(mut record) => {
                    record.refcount = record.refcount.checked_add(1).ok_or_else(|| {
                        KeyTrieError::Corruption(format!("node {} refcount overflow", record.id))
                    })?;
                    if i == last {
                        record.set_leaf(payload.to_vec());
                    }
                    record
                }
                None => {
                    let id = match self.allocator.allocate_one(txn)? {
                        Some(id) => id,
                        None => {
                            warn!(parent_id, "No id left for a new index node");
                            return Err(KeyTrieError::IdSpaceExhausted);
                        }
                    };
                    debug!(node = id, parent_id, "Created index node");
                    if i == last {
                        NodeRecord::leaf(id, payload.to_vec())
                    } else {
                        NodeRecord::interior(id)
                    }
                }
            };

            table.insert(&node_key, record.encode()?.as_slice())?;
            parent_id = record.id;
        }

        Ok(())
    }

    /// Delete `key`
    ///
    /// Every node on the path loses one reference; nodes left without any are
    /// removed and their ids freed. Nodes still shared with other keys keep
    /// their payload, except the terminal node which stops being a leaf.
    ///
    /// Returns whether the key was stored. Deleting an absent key changes
    /// nothing.
    pub fn delete(&self, txn: &WriteTransaction, key: &[u8]) -> Result<bool> {
        let mut table = txn.open_table(INDEX_NODES)?;

        // Phase 1: locate the whole path before touching anything
        let path = match locate(&table, &chop(key, self.max_segment_size))? {
            Some(path) => path,
            None => return Ok(false),
        };

        // Phase 2: unwind
        let last = path.len() - 1;
        for (i, (node_key, mut record)) in path.into_iter().enumerate() {
            record.refcount -= 1;

            if record.refcount > 0 {
                if i == last {
                    record.clear_leaf();
                }
                table.insert(&node_key, record.encode()?.as_slice())?;
            } else {
                table.remove(&node_key)?;
                self.allocator.free_one(txn, record.id)?;
                debug!(node = record.id, "Destroyed index node");
            }
        }

        Ok(true)
    }

    /// Look up a single node by its table key
    pub fn node(
        &self,
        txn: &impl ReadTxn,
        parent_id: u64,
        segment: &[u8],
    ) -> Result<Option<IndexNode>> {
        let table = match txn.open_readable(INDEX_NODES)? {
            Some(table) => table,
            None => return Ok(None),
        };

        let node_key = NodeKey::new(parent_id, segment);
        let record = match table.get(&node_key)? {
            Some(value) => NodeRecord::decode(value.value())?,
            None => return Ok(None),
        };
        Ok(Some(IndexNode::from_parts(node_key, record)))
    }

    /// The nodes along a stored key, root first
    pub fn path(&self, txn: &impl ReadTxn, key: &[u8]) -> Result<Option<Vec<IndexNode>>> {
        let table = match txn.open_readable(INDEX_NODES)? {
            Some(table) => table,
            None => return Ok(None),
        };

        Ok(locate(&table, &chop(key, self.max_segment_size))?.map(|path| {
            path.into_iter()
                .map(|(node_key, record)| IndexNode::from_parts(node_key, record))
                .collect()
        }))
    }

    /// Every node of the index, in table order
    pub fn nodes(&self, txn: &impl ReadTxn) -> Result<Vec<IndexNode>> {
        let table = match txn.open_readable(INDEX_NODES)? {
            Some(table) => table,
            None => return Ok(Vec::new()),
        };

        let mut nodes = Vec::new();
        for entry in table.iter()? {
            let (key, value) = entry?;
            let record = NodeRecord::decode(value.value())?;
            nodes.push(IndexNode::from_parts(key.value(), record));
        }
        Ok(nodes)
    }

    /// Number of nodes in the index
    pub fn node_count(&self, txn: &impl ReadTxn) -> Result<u64> {
        match txn.open_readable(INDEX_NODES)? {
            Some(table) => Ok(table.len()?),
            None => Ok(0),
        }
    }
}

/// Walk the segments from the root
///
/// Returns `None` when a segment is missing or the terminal node is not a
/// leaf, i.e. the key is not stored.
fn locate<T>(table: &T, segments: &[&[u8]]) -> Result<Option<NodePath>>
where
    T: ReadableTable<NodeKey, &'static [u8]>,
{
    let mut path = Vec::with_capacity(segments.len());
    let mut parent_id = SENTINEL_ROOT;

    for (i, segment) in segments.iter().enumerate() {
        let node_key = NodeKey::new(parent_id, *segment);
        let record = match table.get(&node_key)? {
            Some(value) => NodeRecord::decode(value.value())?,
            None => return Ok(None),
        };

        if i == segments.len() - 1 && !record.is_leaf {
            return Ok(None);
        }

        parent_id = record.id;
        path.push((node_key, record));
    }

    Ok(Some(path))
}
