//! Codec Module
//!
//! Explicit binary encodings for records persisted in the host store.
//!
//! ## Responsibilities
//! - Encode/decode trie node keys `(parent_id, segment)`
//! - Provide the node-key comparator registered with the host store
//! - Encode/decode trie node values with a checksum trailer
//!
//! ## Node Key Format
//! ```text
//! ┌──────────────────────┬─────────────────────────────┐
//! │ Parent ID (8, BE)    │   Segment (0..=max bytes)   │
//! └──────────────────────┴─────────────────────────────┘
//! ```
//!
//! ## Node Record Format
//! ```text
//! ┌─────────────────────────────────────────┬──────────┐
//! │ bincode(id, refcount, is_leaf, payload) │ CRC32(4) │
//! └─────────────────────────────────────────┴──────────┘
//! ```

mod node_key;
mod node_record;

pub use node_key::NodeKey;
pub use node_record::NodeRecord;

/// Size of the parent id prefix in an encoded node key
pub const PARENT_ID_SIZE: usize = 8;

/// Size of the checksum trailer of an encoded node record
pub const CRC_SIZE: usize = 4;
