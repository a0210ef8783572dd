//! Node record encoding
//!
//! Value stored alongside each node key. Carries the node's identity and
//! reference count, and the payload when some key terminates at the node.

use serde::{Deserialize, Serialize};

use crate::error::{KeyTrieError, Result};

use super::CRC_SIZE;

/// Persisted value of a trie node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Id allocated to this node; children use it as their parent id
    pub id: u64,

    /// Number of stored key paths passing through this node
    pub refcount: u64,

    /// Whether a stored key terminates at this node
    pub is_leaf: bool,

    /// Payload of the terminating key (`None` unless `is_leaf`)
    pub payload: Option<Vec<u8>>,
}

impl NodeRecord {
    /// A node created for a key whose path ends here
    pub fn leaf(id: u64, payload: Vec<u8>) -> Self {
        Self {
            id,
            refcount: 1,
            is_leaf: true,
            payload: Some(payload),
        }
    }

    /// A node created as an interior path element
    pub fn interior(id: u64) -> Self {
        Self {
            id,
            refcount: 1,
            is_leaf: false,
            payload: None,
        }
    }

    /// Mark this node as the end of a key and attach its payload
    pub fn set_leaf(&mut self, payload: Vec<u8>) {
        self.is_leaf = true;
        self.payload = Some(payload);
    }

    /// Drop the leaf marker and its payload
    pub fn clear_leaf(&mut self) {
        self.is_leaf = false;
        self.payload = None;
    }

    /// Serialize with a trailing CRC32 over the bincode body
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = bincode::serialize(self)?;
        let crc = crc32fast::hash(&buf);
        buf.extend_from_slice(&crc.to_le_bytes());
        Ok(buf)
    }

    /// Verify the checksum and deserialize
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() < CRC_SIZE {
            return Err(KeyTrieError::Corruption(format!(
                "node record too short: {} bytes",
                data.len()
            )));
        }

        let (body, trailer) = data.split_at(data.len() - CRC_SIZE);
        let mut crc_bytes = [0u8; CRC_SIZE];
        crc_bytes.copy_from_slice(trailer);
        let expected = u32::from_le_bytes(crc_bytes);
        let actual = crc32fast::hash(body);

        if expected != actual {
            return Err(KeyTrieError::Corruption(format!(
                "node record checksum mismatch: expected {:08x}, got {:08x}",
                expected, actual
            )));
        }

        let record: NodeRecord = bincode::deserialize(body)?;
        if record.refcount == 0 {
            return Err(KeyTrieError::Corruption(format!(
                "node {} stored with zero refcount",
                record.id
            )));
        }
        Ok(record)
    }
}
