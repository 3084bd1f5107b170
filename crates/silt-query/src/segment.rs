//! Per-arena segments of a group container.
//!
//! An [`ArenaSegment`] wraps one participating arena together with the
//! sorted list of slot entries the group tracks for it. Entries are kept
//! ordered by `(index, generation)` at all times, which is what makes
//! insert, remove, and membership O(log n) binary searches.

use std::fmt;
use std::sync::Arc;

use silt_arena::{AnyHandle, VoidHandle};
use silt_core::traits::{ComponentSource, QueryArena, SlotAccess};

/// A tracked slot entry: the two fields a handle carries besides its
/// arena.
///
/// Derived ordering compares `index` first, then `generation`, which is
/// the sort key for segment entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotKey {
    /// Slot index within the segment's arena.
    pub index: u32,
    /// Generation the entry was added with.
    pub generation: u32,
}

impl SlotKey {
    /// Build a key from its parts.
    pub fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// The key a handle would occupy in its owning segment.
    pub fn of(handle: &AnyHandle) -> Self {
        Self {
            index: handle.index(),
            generation: handle.generation(),
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, gen {})", self.index, self.generation)
    }
}

/// One arena's worth of tracked entries inside a group container.
///
/// Invariant: `entries` is always sorted by `(index, generation)` with
/// no duplicates. All mutation goes through [`ArenaSegment::insert`] and
/// [`ArenaSegment::remove`], which maintain it via binary search;
/// [`ArenaSegment::compact`] only removes, preserving relative order.
pub struct ArenaSegment {
    arena: Arc<dyn QueryArena>,
    entries: Vec<SlotKey>,
}

impl ArenaSegment {
    pub(crate) fn new(arena: Arc<dyn QueryArena>) -> Self {
        Self {
            arena,
            entries: Vec::new(),
        }
    }

    /// The arena this segment tracks entries for.
    pub fn arena(&self) -> &Arc<dyn QueryArena> {
        &self.arena
    }

    /// Number of tracked entries, live or stale.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tracked entries whose backing slot is still valid.
    pub fn active_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|key| self.arena.is_valid_raw(key.index, key.generation))
            .count()
    }

    /// Insert at the binary-search position; `false` if already tracked.
    pub(crate) fn insert(&mut self, key: SlotKey) -> bool {
        match self.entries.binary_search(&key) {
            Ok(_) => false,
            Err(position) => {
                self.entries.insert(position, key);
                true
            }
        }
    }

    /// Remove by exact binary-search match; `false` if untracked.
    pub(crate) fn remove(&mut self, key: SlotKey) -> bool {
        match self.entries.binary_search(&key) {
            Ok(position) => {
                self.entries.remove(position);
                true
            }
            Err(_) => false,
        }
    }

    /// Whether `key` is tracked.
    pub fn contains(&self, key: SlotKey) -> bool {
        self.entries.binary_search(&key).is_ok()
    }

    /// Drop entries whose backing slot is no longer valid.
    ///
    /// Single linear pass; relative order of survivors is preserved.
    /// Returns the number of entries removed.
    pub(crate) fn compact(&mut self) -> usize {
        let before = self.entries.len();
        let arena = &self.arena;
        self.entries
            .retain(|key| arena.is_valid_raw(key.index, key.generation));
        before - self.entries.len()
    }

    pub(crate) fn entries(&self) -> &[SlotKey] {
        &self.entries
    }

    /// Re-mint the erased handle for a tracked entry.
    pub(crate) fn any_handle(&self, key: SlotKey) -> AnyHandle {
        let arena: Arc<dyn SlotAccess> = self.arena.clone();
        AnyHandle::from_raw_parts(arena, key.index, key.generation)
    }

    /// Re-mint the component-capable handle for a tracked entry.
    pub(crate) fn void_handle(&self, key: SlotKey) -> VoidHandle {
        let arena: Arc<dyn ComponentSource> = self.arena.clone();
        VoidHandle::from_raw_parts(arena, key.index, key.generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use silt_arena::GenerationalArena;

    fn segment_with_arena() -> (ArenaSegment, Arc<GenerationalArena<u32>>) {
        let arena = GenerationalArena::<u32>::builder().build();
        (ArenaSegment::new(arena.clone()), arena)
    }

    #[test]
    fn insert_keeps_entries_sorted() {
        let (mut segment, _arena) = segment_with_arena();
        for index in [5u32, 1, 9, 3, 7] {
            assert!(segment.insert(SlotKey::new(index, 1)));
        }
        let indices: Vec<_> = segment.entries().iter().map(|k| k.index).collect();
        assert_eq!(indices, vec![1, 3, 5, 7, 9]);
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let (mut segment, _arena) = segment_with_arena();
        assert!(segment.insert(SlotKey::new(2, 1)));
        assert!(!segment.insert(SlotKey::new(2, 1)));
        assert_eq!(segment.len(), 1);
    }

    #[test]
    fn same_index_different_generation_coexist() {
        let (mut segment, _arena) = segment_with_arena();
        assert!(segment.insert(SlotKey::new(2, 1)));
        assert!(segment.insert(SlotKey::new(2, 3)));
        assert_eq!(segment.len(), 2);
        assert!(segment.contains(SlotKey::new(2, 1)));
        assert!(segment.contains(SlotKey::new(2, 3)));
    }

    #[test]
    fn remove_is_idempotent() {
        let (mut segment, _arena) = segment_with_arena();
        segment.insert(SlotKey::new(4, 1));
        assert!(segment.remove(SlotKey::new(4, 1)));
        assert!(!segment.remove(SlotKey::new(4, 1)));
    }

    #[test]
    fn compact_drops_stale_entries_in_order() {
        let arena = GenerationalArena::<u32>::builder().build();
        let mut segment = ArenaSegment::new(arena.clone());
        let handles: Vec<_> = (0..6).map(|_| arena.allocate()).collect();
        for h in &handles {
            segment.insert(SlotKey::new(h.index(), h.generation()));
        }
        arena.deallocate(&handles[1]);
        arena.deallocate(&handles[4]);
        assert_eq!(segment.active_count(), 4);
        assert_eq!(segment.compact(), 2);
        assert_eq!(segment.len(), 4);
        assert_eq!(segment.active_count(), segment.len());
        let indices: Vec<_> = segment.entries().iter().map(|k| k.index).collect();
        assert_eq!(indices, vec![0, 2, 3, 5]);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn random_insert_order_always_sorted_and_searchable(
                mut keys in proptest::collection::vec((0u32..64, 1u32..8), 1..40),
            ) {
                let arena = GenerationalArena::<u32>::builder().build();
                let mut segment = ArenaSegment::new(arena);
                for &(index, generation) in &keys {
                    segment.insert(SlotKey::new(index, generation));
                }
                // Sorted, deduplicated.
                let entries = segment.entries();
                prop_assert!(entries.windows(2).all(|w| w[0] < w[1]));
                keys.sort_unstable();
                keys.dedup();
                prop_assert_eq!(entries.len(), keys.len());
                // Every inserted key is found by exact search.
                for &(index, generation) in &keys {
                    prop_assert!(segment.contains(SlotKey::new(index, generation)));
                }
            }
        }
    }
}
