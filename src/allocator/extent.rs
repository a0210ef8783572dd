//! Free extent definition

use std::fmt;

use crate::error::{KeyTrieError, Result};

use super::SENTINEL_ID;

/// A contiguous range of ids `[start, start + length)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Extent {
    /// First id of the range
    pub start: u64,

    /// Number of ids in the range
    pub length: u64,
}

impl Extent {
    pub fn new(start: u64, length: u64) -> Self {
        Self { start, length }
    }

    /// Build a range supplied by a caller, rejecting empty ranges and ranges
    /// reaching the sentinel id
    pub fn checked(start: u64, length: u64) -> Result<Self> {
        if length == 0 {
            return Err(KeyTrieError::InvalidLength);
        }
        match start.checked_add(length) {
            Some(end) if end <= SENTINEL_ID => Ok(Self { start, length }),
            _ => Err(KeyTrieError::InvalidRange { start, length }),
        }
    }

    /// One past the last id of the range
    pub fn end(&self) -> u64 {
        self.start.saturating_add(self.length)
    }

    /// Whether `id` lies inside the range
    pub fn contains(&self, id: u64) -> bool {
        id >= self.start && id < self.end()
    }

    /// Whether the two ranges share at least one id
    pub fn overlaps(&self, other: &Extent) -> bool {
        self.start < other.end() && other.start < self.end()
    }

    /// Whether `other` starts exactly where this range ends
    pub fn precedes(&self, other: &Extent) -> bool {
        self.end() == other.start
    }
}

impl fmt::Display for Extent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end())
    }
}
