//! Index Module
//!
//! Composite-key index stored as a refcounted trie of key segments.
//!
//! ## Responsibilities
//! - Chop long keys into bounded segments
//! - Store each segment as a node keyed by `(parent_id, segment)`
//! - Share nodes between keys with a common segment prefix
//! - Reclaim nodes (and their ids) once no stored key passes through them
//!
//! ## Layout
//! Keys `"abcd"` and `"abxy"` with a segment size of 2:
//! ```text
//!                (ROOT, "ab")  id=7  refcount=2
//!                 /                        \
//!   (7, "cd")  id=8  refcount=1    (7, "xy")  id=9  refcount=1
//!   leaf → payload of "abcd"       leaf → payload of "abxy"
//! ```
//! A node can be a leaf for one key and an interior element of longer keys at
//! the same time.

mod chop;
mod node;
mod store;

pub use chop::chop;
pub use node::IndexNode;
pub use store::{IndexStore, INDEX_META, INDEX_NODES};

/// Parent id of top-level segments
pub const SENTINEL_ROOT: u64 = crate::allocator::SENTINEL_ID;
