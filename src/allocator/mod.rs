//! Allocator Module
//!
//! Extent-based allocator for the global 64-bit identifier space.
//!
//! ## Responsibilities
//! - Seed the free-extent table with the full id range on first open
//! - Grant ids lowest-address-first, optionally as contiguous ranges
//! - Return ids to the free table, coalescing with adjacent free extents
//! - Refuse double frees without touching the table
//!
//! ## Free Table
//! ```text
//! free_extents:  start (u64) ──► length (u64)
//!
//!   [0, 5) allocated    [5, 9) free    [9, 12) allocated    [12, MAX) free
//!                       ┌──────────┐                        ┌────────────┐
//!                       │ 5 ──► 4  │                        │ 12 ──► ... │
//!                       └──────────┘                        └────────────┘
//! ```
//! Extents never overlap and never touch: two adjacent free extents are
//! always merged into one.

mod extent;
mod id_allocator;

pub use extent::Extent;
pub use id_allocator::{IdAllocator, FREE_EXTENTS};

/// Reserved id: never allocatable, used as the parent id of top-level index
/// segments
pub const SENTINEL_ID: u64 = u64::MAX;

/// Length of the seed extent covering every allocatable id `[0, SENTINEL_ID)`
pub const FULL_RANGE_LENGTH: u64 = SENTINEL_ID;
