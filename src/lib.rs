//! # KeyTrie
//!
//! Identifier management and hierarchical keys for an embedded store:
//! - Extent-based allocator over a dense 64-bit id space
//! - Composite-key index: long keys chopped into refcounted, shared segments
//! - Flat id → bytes payload table
//! - All state kept in redb tables, changed only inside caller transactions
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Caller                              │
//! │             (begin_write / begin_read, commit)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┼─────────────────────┐
//!          │            │                     │
//!          ▼            ▼                     ▼
//!   ┌─────────────┐ ┌─────────────┐   ┌─────────────┐
//!   │ IndexStore  │ │ IdAllocator │   │  DataStore  │
//!   │   (trie)    ├─►  (extents)  │   │ (payloads)  │
//!   └──────┬──────┘ └──────┬──────┘   └──────┬──────┘
//!          │               │                 │
//!          ▼               ▼                 ▼
//!   ┌─────────────────────────────────────────────────┐
//!   │                redb Database                     │
//!   │  index_nodes   free_extents   payloads   meta    │
//!   └─────────────────────────────────────────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod txn;
pub mod allocator;
pub mod index;
pub mod data;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{KeyTrieError, Result};
pub use config::Config;
pub use allocator::{Extent, IdAllocator, SENTINEL_ID};
pub use index::{IndexNode, IndexStore, SENTINEL_ROOT};
pub use data::DataStore;
pub use engine::{Engine, Stats};
pub use txn::ReadTxn;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of KeyTrie
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
