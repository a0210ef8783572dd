//! Tests for IdAllocator
//!
//! These tests verify:
//! - Seeding of the free extent table
//! - Greedy lowest-address-first allocation
//! - Coalescing with one or both neighbours on free
//! - Double free and invalid range refusal
//! - Exhaustion handling
//! - Transaction semantics (abort, reopen)

use keytrie::allocator::{Extent, IdAllocator, FULL_RANGE_LENGTH, SENTINEL_ID};
use keytrie::KeyTrieError;
use proptest::prelude::*;
use redb::Database;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_allocator() -> (TempDir, Database, IdAllocator) {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::create(temp_dir.path().join("alloc.redb")).unwrap();
    let allocator = IdAllocator::open(&db).unwrap();
    (temp_dir, db, allocator)
}

fn extents(db: &Database, allocator: &IdAllocator) -> Vec<Extent> {
    let txn = db.begin_read().unwrap();
    allocator.free_extents(&txn).unwrap()
}

fn allocate(db: &Database, allocator: &IdAllocator, len: u64) -> Option<Extent> {
    let txn = db.begin_write().unwrap();
    let extent = allocator.allocate(&txn, len).unwrap();
    txn.commit().unwrap();
    extent
}

fn free(db: &Database, allocator: &IdAllocator, start: u64, len: u64) {
    let txn = db.begin_write().unwrap();
    allocator.free(&txn, start, len).unwrap();
    txn.commit().unwrap();
}

/// Allocate the whole id space so the free table is empty
fn drain(db: &Database, allocator: &IdAllocator) {
    let granted = allocate(db, allocator, u64::MAX).unwrap();
    assert_eq!(granted, Extent::new(0, FULL_RANGE_LENGTH));
    assert!(extents(db, allocator).is_empty());
}

// =============================================================================
// Open Tests
// =============================================================================

#[test]
fn test_open_seeds_full_range() {
    let (_temp, db, allocator) = setup_allocator();

    assert_eq!(extents(&db, &allocator), vec![Extent::new(0, SENTINEL_ID)]);

    let txn = db.begin_read().unwrap();
    assert_eq!(allocator.free_extent_count(&txn).unwrap(), 1);
    assert_eq!(allocator.free_id_count(&txn).unwrap(), u64::MAX);
}

#[test]
fn test_reopen_keeps_state() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("alloc.redb");

    {
        let db = Database::create(&path).unwrap();
        let allocator = IdAllocator::open(&db).unwrap();
        assert_eq!(allocate(&db, &allocator, 5), Some(Extent::new(0, 5)));
    }

    let db = Database::create(&path).unwrap();
    let allocator = IdAllocator::open(&db).unwrap();
    assert_eq!(allocate(&db, &allocator, 1), Some(Extent::new(5, 1)));
}

#[test]
fn test_reopen_does_not_reseed_exhausted_table() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("alloc.redb");

    {
        let db = Database::create(&path).unwrap();
        let allocator = IdAllocator::open(&db).unwrap();
        drain(&db, &allocator);
    }

    let db = Database::create(&path).unwrap();
    let allocator = IdAllocator::open(&db).unwrap();
    assert!(extents(&db, &allocator).is_empty());
    assert_eq!(allocate(&db, &allocator, 1), None);
}

// =============================================================================
// Allocate Tests
// =============================================================================

#[test]
fn test_allocate_one_is_sequential() {
    let (_temp, db, allocator) = setup_allocator();

    let txn = db.begin_write().unwrap();
    assert_eq!(allocator.allocate_one(&txn).unwrap(), Some(0));
    assert_eq!(allocator.allocate_one(&txn).unwrap(), Some(1));
    assert_eq!(allocator.allocate_one(&txn).unwrap(), Some(2));
    txn.commit().unwrap();

    assert_eq!(extents(&db, &allocator), vec![Extent::new(3, SENTINEL_ID - 3)]);
}

#[test]
fn test_allocate_range() {
    let (_temp, db, allocator) = setup_allocator();

    assert_eq!(allocate(&db, &allocator, 100), Some(Extent::new(0, 100)));
    assert_eq!(allocate(&db, &allocator, 10), Some(Extent::new(100, 10)));
    assert_eq!(extents(&db, &allocator), vec![Extent::new(110, SENTINEL_ID - 110)]);
}

#[test]
fn test_allocate_zero_is_invalid() {
    let (_temp, db, allocator) = setup_allocator();

    let txn = db.begin_write().unwrap();
    assert!(matches!(
        allocator.allocate(&txn, 0),
        Err(KeyTrieError::InvalidLength)
    ));
}

#[test]
fn test_grant_is_never_split_across_extents() {
    let (_temp, db, allocator) = setup_allocator();

    allocate(&db, &allocator, 10);
    free(&db, &allocator, 2, 3);

    // Lowest extent only holds 3 ids: a smaller grant, not a search
    assert_eq!(allocate(&db, &allocator, 5), Some(Extent::new(2, 3)));
    assert_eq!(allocate(&db, &allocator, 5), Some(Extent::new(10, 5)));
}

#[test]
fn test_exhaustion_boundary() {
    let (_temp, db, allocator) = setup_allocator();
    drain(&db, &allocator);

    free(&db, &allocator, 42, 1);
    assert_eq!(extents(&db, &allocator), vec![Extent::new(42, 1)]);

    let txn = db.begin_write().unwrap();
    assert_eq!(allocator.allocate_one(&txn).unwrap(), Some(42));
    assert_eq!(allocator.allocate_one(&txn).unwrap(), None);
    assert_eq!(allocator.allocate(&txn, 10).unwrap(), None);
    txn.commit().unwrap();
}

#[test]
fn test_sentinel_is_never_allocated() {
    let (_temp, db, allocator) = setup_allocator();

    let granted = allocate(&db, &allocator, u64::MAX).unwrap();
    assert!(!granted.contains(SENTINEL_ID));
    assert_eq!(granted.end(), SENTINEL_ID);
}

// =============================================================================
// Free / Coalescing Tests
// =============================================================================

#[test]
fn test_free_merges_with_successor() {
    let (_temp, db, allocator) = setup_allocator();
    allocate(&db, &allocator, 10);

    free(&db, &allocator, 9, 1);

    assert_eq!(extents(&db, &allocator), vec![Extent::new(9, SENTINEL_ID - 9)]);
}

#[test]
fn test_free_merges_with_predecessor() {
    let (_temp, db, allocator) = setup_allocator();
    allocate(&db, &allocator, 10);

    free(&db, &allocator, 0, 2);
    free(&db, &allocator, 2, 3);

    assert_eq!(
        extents(&db, &allocator),
        vec![Extent::new(0, 5), Extent::new(10, SENTINEL_ID - 10)]
    );
}

#[test]
fn test_free_merges_both_neighbours() {
    let (_temp, db, allocator) = setup_allocator();
    allocate(&db, &allocator, 10);

    free(&db, &allocator, 0, 2);
    free(&db, &allocator, 5, 2);
    assert_eq!(extents(&db, &allocator).len(), 3);

    free(&db, &allocator, 2, 3);
    assert_eq!(
        extents(&db, &allocator),
        vec![Extent::new(0, 7), Extent::new(10, SENTINEL_ID - 10)]
    );

    free(&db, &allocator, 7, 3);
    assert_eq!(extents(&db, &allocator), vec![Extent::new(0, SENTINEL_ID)]);
}

#[test]
fn test_free_standalone() {
    let (_temp, db, allocator) = setup_allocator();
    allocate(&db, &allocator, 10);

    free(&db, &allocator, 4, 2);

    assert_eq!(
        extents(&db, &allocator),
        vec![Extent::new(4, 2), Extent::new(10, SENTINEL_ID - 10)]
    );
}

#[test]
fn test_free_into_empty_table() {
    let (_temp, db, allocator) = setup_allocator();
    drain(&db, &allocator);

    free(&db, &allocator, 100, 10);

    assert_eq!(extents(&db, &allocator), vec![Extent::new(100, 10)]);
}

#[test]
fn test_free_after_last_extent() {
    let (_temp, db, allocator) = setup_allocator();
    drain(&db, &allocator);
    free(&db, &allocator, 100, 10);

    // No extent starts at or after 110: only the last extent can merge
    free(&db, &allocator, 110, 5);
    assert_eq!(extents(&db, &allocator), vec![Extent::new(100, 15)]);

    free(&db, &allocator, 200, 5);
    assert_eq!(
        extents(&db, &allocator),
        vec![Extent::new(100, 15), Extent::new(200, 5)]
    );
}

#[test]
fn test_free_before_first_extent() {
    let (_temp, db, allocator) = setup_allocator();
    drain(&db, &allocator);
    free(&db, &allocator, 100, 10);

    free(&db, &allocator, 90, 10);
    assert_eq!(extents(&db, &allocator), vec![Extent::new(90, 20)]);
}

#[test]
fn test_allocate_free_round_trip() {
    let (_temp, db, allocator) = setup_allocator();
    allocate(&db, &allocator, 10);
    free(&db, &allocator, 3, 2);
    let before = extents(&db, &allocator);

    let granted = allocate(&db, &allocator, 2).unwrap();
    assert_eq!(granted, Extent::new(3, 2));
    free(&db, &allocator, granted.start, granted.length);

    assert_eq!(extents(&db, &allocator), before);
}

#[test]
fn test_free_single_ids_in_reverse() {
    let (_temp, db, allocator) = setup_allocator();
    allocate(&db, &allocator, 100);

    let txn = db.begin_write().unwrap();
    for id in (0..100).rev() {
        allocator.free_one(&txn, id).unwrap();
    }
    assert_eq!(allocator.free_extent_count(&txn).unwrap(), 1);
    txn.commit().unwrap();

    assert_eq!(extents(&db, &allocator), vec![Extent::new(0, SENTINEL_ID)]);
}

// =============================================================================
// Refusal Tests
// =============================================================================

#[test]
fn test_double_free_is_refused() {
    let (_temp, db, allocator) = setup_allocator();
    allocate(&db, &allocator, 10);
    free(&db, &allocator, 5, 1);
    let before = extents(&db, &allocator);

    let txn = db.begin_write().unwrap();
    let result = allocator.free(&txn, 5, 1);
    assert!(matches!(
        result,
        Err(KeyTrieError::DoubleFree {
            start: 5,
            length: 1,
            free_start: 5,
            free_length: 1,
        })
    ));
    assert_eq!(allocator.free_extents(&txn).unwrap(), before);
}

#[test]
fn test_partial_overlap_with_successor_is_refused() {
    let (_temp, db, allocator) = setup_allocator();
    allocate(&db, &allocator, 10);
    free(&db, &allocator, 5, 1);
    let before = extents(&db, &allocator);

    let txn = db.begin_write().unwrap();
    assert!(matches!(
        allocator.free(&txn, 4, 3),
        Err(KeyTrieError::DoubleFree { free_start: 5, .. })
    ));
    assert_eq!(allocator.free_extents(&txn).unwrap(), before);
}

#[test]
fn test_partial_overlap_with_predecessor_is_refused() {
    let (_temp, db, allocator) = setup_allocator();
    allocate(&db, &allocator, 10);
    free(&db, &allocator, 3, 2);

    let txn = db.begin_write().unwrap();
    assert!(matches!(
        allocator.free(&txn, 4, 1),
        Err(KeyTrieError::DoubleFree { free_start: 3, .. })
    ));
}

#[test]
fn test_freeing_never_allocated_ids_is_refused() {
    let (_temp, db, allocator) = setup_allocator();

    let txn = db.begin_write().unwrap();
    assert!(matches!(
        allocator.free(&txn, 0, 1),
        Err(KeyTrieError::DoubleFree { .. })
    ));
    assert!(matches!(
        allocator.free(&txn, 1_000_000, 50),
        Err(KeyTrieError::DoubleFree { .. })
    ));
}

#[test]
fn test_invalid_free_ranges() {
    let (_temp, db, allocator) = setup_allocator();
    allocate(&db, &allocator, 10);

    let txn = db.begin_write().unwrap();
    assert!(matches!(
        allocator.free(&txn, 3, 0),
        Err(KeyTrieError::InvalidLength)
    ));
    assert!(matches!(
        allocator.free(&txn, SENTINEL_ID, 1),
        Err(KeyTrieError::InvalidRange { .. })
    ));
    assert!(matches!(
        allocator.free(&txn, u64::MAX - 2, 10),
        Err(KeyTrieError::InvalidRange { .. })
    ));
}

// =============================================================================
// Transaction Tests
// =============================================================================

#[test]
fn test_aborted_allocation_is_discarded() {
    let (_temp, db, allocator) = setup_allocator();

    {
        let txn = db.begin_write().unwrap();
        assert_eq!(allocator.allocate_one(&txn).unwrap(), Some(0));
        txn.abort().unwrap();
    }
    {
        let txn = db.begin_write().unwrap();
        assert_eq!(allocator.allocate_one(&txn).unwrap(), Some(0));
        // Dropped without commit
    }

    assert_eq!(extents(&db, &allocator), vec![Extent::new(0, SENTINEL_ID)]);
}

#[test]
fn test_operations_in_one_transaction_compose() {
    let (_temp, db, allocator) = setup_allocator();

    let txn = db.begin_write().unwrap();
    let first = allocator.allocate(&txn, 4).unwrap().unwrap();
    allocator.free(&txn, first.start, first.length).unwrap();
    let second = allocator.allocate(&txn, 4).unwrap().unwrap();
    assert_eq!(first, second);

    // Uncommitted: a reader still sees the seed extent
    let reader = db.begin_read().unwrap();
    assert_eq!(
        allocator.free_extents(&reader).unwrap(),
        vec![Extent::new(0, SENTINEL_ID)]
    );
    drop(reader);

    txn.commit().unwrap();
    assert_eq!(extents(&db, &allocator), vec![Extent::new(4, SENTINEL_ID - 4)]);
}

// =============================================================================
// Property Tests
// =============================================================================

#[derive(Debug, Clone)]
enum Op {
    Alloc(u64),
    Free(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1u64..8).prop_map(Op::Alloc),
        any::<usize>().prop_map(Op::Free),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn live_allocations_never_overlap(ops in proptest::collection::vec(op_strategy(), 1..120)) {
        let (_temp, db, allocator) = setup_allocator();
        let mut live: Vec<Extent> = Vec::new();

        let txn = db.begin_write().unwrap();
        for op in ops {
            match op {
                Op::Alloc(len) => {
                    let granted = allocator.allocate(&txn, len).unwrap().unwrap();
                    prop_assert!(granted.length >= 1 && granted.length <= len);
                    for held in &live {
                        prop_assert!(!held.overlaps(&granted), "{} overlaps {}", granted, held);
                    }
                    live.push(granted);
                }
                Op::Free(pick) => {
                    if live.is_empty() {
                        continue;
                    }
                    let freed = live.swap_remove(pick % live.len());
                    allocator.free(&txn, freed.start, freed.length).unwrap();
                }
            }
        }

        let free_extents = allocator.free_extents(&txn).unwrap();

        // Sorted, disjoint and never adjacent
        for pair in free_extents.windows(2) {
            prop_assert!(pair[0].end() < pair[1].start);
        }

        // Free and live ranges partition the id space
        for extent in &free_extents {
            for held in &live {
                prop_assert!(!held.overlaps(extent));
            }
        }
        let free_total: u64 = free_extents.iter().map(|e| e.length).sum();
        let live_total: u64 = live.iter().map(|e| e.length).sum();
        prop_assert_eq!(free_total + live_total, FULL_RANGE_LENGTH);

        // Returning everything restores the seed extent
        for held in live.drain(..) {
            allocator.free(&txn, held.start, held.length).unwrap();
        }
        prop_assert_eq!(
            allocator.free_extents(&txn).unwrap(),
            vec![Extent::new(0, SENTINEL_ID)]
        );
    }
}
