//! Data Module
//!
//! Flat payload table attaching bytes to allocated ids.
//!
//! Ids are not checked against the allocator: callers allocate an id first,
//! then store data under it.

mod store;

pub use store::{DataStore, PAYLOADS};
