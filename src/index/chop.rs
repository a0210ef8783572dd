//! Key chopping
//!
//! Splits arbitrarily long keys into bounded segments, one per trie node.

/// Split `key` into consecutive segments of at most `max_segment_size` bytes
///
/// Order is preserved and only the last segment may be shorter. The empty
/// key is a single empty segment, so it still owns exactly one node.
pub fn chop(key: &[u8], max_segment_size: usize) -> Vec<&[u8]> {
    debug_assert!(max_segment_size > 0, "segment size must be positive");

    if key.is_empty() {
        return vec![key];
    }
    key.chunks(max_segment_size.max(1)).collect()
}
