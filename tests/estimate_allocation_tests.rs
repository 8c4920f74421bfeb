//! Allocation Tests for Size Estimation
//!
//! Estimating a value walks it in place. These tests count the bytes the
//! current thread allocates while estimating and storing large values.

use std::alloc::{GlobalAlloc, Layout, System};
use std::cell::Cell;
use std::collections::HashMap;

use mem_vault::cache::SEQUENCE_HEADER;
use mem_vault::{estimate_size, Cache};

// == Counting Allocator ==
struct CountingAllocator;

thread_local! {
    static ALLOCATED: Cell<usize> = const { Cell::new(0) };
}

unsafe impl GlobalAlloc for CountingAllocator {
    unsafe fn alloc(&self, layout: Layout) -> *mut u8 {
        let _ = ALLOCATED.try_with(|count| count.set(count.get() + layout.size()));
        System.alloc(layout)
    }

    unsafe fn dealloc(&self, ptr: *mut u8, layout: Layout) {
        System.dealloc(ptr, layout)
    }
}

#[global_allocator]
static GLOBAL: CountingAllocator = CountingAllocator;

/// Runs `f` and returns its result with the bytes it allocated on this thread.
fn allocated_during<T>(f: impl FnOnce() -> T) -> (T, usize) {
    let before = ALLOCATED.with(Cell::get);
    let result = f();
    let after = ALLOCATED.with(Cell::get);
    (result, after - before)
}

const PAYLOAD_LEN: usize = 4 << 20;

/// Upper bound for the bookkeeping a single estimate or insert may allocate.
const SMALL_ALLOCATION: usize = 64 * 1024;

// == Estimation ==

#[test]
fn test_estimating_large_sequence_does_not_copy_elements() {
    let payload = vec![0u8; PAYLOAD_LEN];

    let (estimate, allocated) = allocated_during(|| estimate_size(&payload));

    assert_eq!(estimate, SEQUENCE_HEADER + 2 * PAYLOAD_LEN);
    assert!(allocated < 1024, "allocated {} bytes", allocated);
}

#[test]
fn test_estimating_large_map_does_not_copy_pairs() {
    let map: HashMap<u32, u32> = (0..100_000).map(|i| (i, i)).collect();

    let (_, allocated) = allocated_during(|| estimate_size(&map));

    assert!(allocated < 1024, "allocated {} bytes", allocated);
}

#[test]
fn test_estimating_nested_sequences_stays_small() {
    let rows: Vec<Vec<u16>> = (0..1_000).map(|_| vec![7u16; 1_000]).collect();

    let (_, allocated) = allocated_during(|| estimate_size(&rows));

    assert!(allocated < SMALL_ALLOCATION, "allocated {} bytes", allocated);
}

// == Cache Inserts ==

#[test]
fn test_large_value_is_stored_without_transient_copy() {
    let cache: Cache<u32, Vec<u8>> = Cache::new(16).unwrap();
    let payload = vec![0u8; PAYLOAD_LEN];

    let (_, allocated) = allocated_during(|| cache.set(1, payload));

    assert!(cache.contains(&1u32));
    assert!(allocated < SMALL_ALLOCATION, "allocated {} bytes", allocated);
    cache.check_invariants().unwrap();
}
