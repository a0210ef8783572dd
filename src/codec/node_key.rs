//! Node key encoding and comparator
//!
//! Keys of the index node table. Ordered by parent id, then by segment bytes,
//! with the shorter segment first when one is a prefix of the other.

use std::cmp::Ordering;

use redb::{Key, TypeName, Value};

use super::PARENT_ID_SIZE;

/// Key of a trie node: the id of its parent and its own segment bytes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeKey {
    /// Id of the parent node (`SENTINEL_ROOT` for a top-level segment)
    pub parent_id: u64,

    /// Segment bytes of this node
    pub segment: Vec<u8>,
}

impl NodeKey {
    pub fn new(parent_id: u64, segment: impl Into<Vec<u8>>) -> Self {
        Self {
            parent_id,
            segment: segment.into(),
        }
    }

    /// Encode as `parent_id (BE) + segment`
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(PARENT_ID_SIZE + self.segment.len());
        buf.extend_from_slice(&self.parent_id.to_be_bytes());
        buf.extend_from_slice(&self.segment);
        buf
    }

    /// Decode from the format produced by [`NodeKey::encode`]
    pub fn decode(data: &[u8]) -> Self {
        let (parent_id, segment) = split(data);
        Self {
            parent_id,
            segment: segment.to_vec(),
        }
    }
}

/// Split an encoded key into its parent id and segment.
/// A truncated prefix is zero-padded; such keys are never written.
fn split(data: &[u8]) -> (u64, &[u8]) {
    let cut = data.len().min(PARENT_ID_SIZE);
    let mut id_bytes = [0u8; PARENT_ID_SIZE];
    id_bytes[..cut].copy_from_slice(&data[..cut]);
    (u64::from_be_bytes(id_bytes), &data[cut..])
}

/// Total order over encoded node keys
pub(crate) fn compare_encoded(a: &[u8], b: &[u8]) -> Ordering {
    let (a_parent, a_segment) = split(a);
    let (b_parent, b_segment) = split(b);

    a_parent.cmp(&b_parent).then_with(|| {
        let shared = a_segment.len().min(b_segment.len());
        a_segment[..shared]
            .cmp(&b_segment[..shared])
            .then(a_segment.len().cmp(&b_segment.len()))
    })
}

impl Value for NodeKey {
    type SelfType<'a> = NodeKey
    where
        Self: 'a;

    type AsBytes<'a> = Vec<u8>
    where
        Self: 'a;

    fn fixed_width() -> Option<usize> {
        None
    }

    fn from_bytes<'a>(data: &'a [u8]) -> Self::SelfType<'a>
    where
        Self: 'a,
    {
        NodeKey::decode(data)
    }

    fn as_bytes<'a, 'b: 'a>(value: &'a Self::SelfType<'b>) -> Self::AsBytes<'a>
    where
        Self: 'b,
    {
        value.encode()
    }

    fn type_name() -> TypeName {
        TypeName::new("keytrie::NodeKey")
    }
}

impl Key for NodeKey {
    fn compare(data1: &[u8], data2: &[u8]) -> Ordering {
        compare_encoded(data1, data2)
    }
}
