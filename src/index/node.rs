//! Index node view
//!
//! Public, decoded form of a stored trie node.

use crate::codec::{NodeKey, NodeRecord};

/// A trie node as stored in the index table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexNode {
    /// Id of the parent node (`SENTINEL_ROOT` for a top-level segment)
    pub parent_id: u64,

    /// Id allocated to this node
    pub id: u64,

    /// Number of stored key paths passing through this node
    pub refcount: u64,

    /// Segment bytes of this node
    pub segment: Vec<u8>,

    /// Whether a stored key terminates at this node
    pub is_leaf: bool,

    /// Payload of the key terminating here
    pub payload: Option<Vec<u8>>,
}

impl IndexNode {
    pub(crate) fn from_parts(key: NodeKey, record: NodeRecord) -> Self {
        Self {
            parent_id: key.parent_id,
            id: record.id,
            refcount: record.refcount,
            segment: key.segment,
            is_leaf: record.is_leaf,
            payload: record.payload,
        }
    }
}
