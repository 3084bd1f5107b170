//! Multi-arena group containers.
//!
//! A [`GroupContainer`] lets several concrete arenas that share a group
//! capability be treated as one collection: membership is explicit
//! (`add`/`remove`), lookup is binary search within the owning segment,
//! and traversal is allocation-free. Typed views over the group filter
//! to entries whose entity kind carries a requested component set.
//!
//! Entries do not track arena deallocation on their own; a group holding
//! handles to despawned entities simply reports them inactive until
//! [`GroupContainer::compact`] sweeps them out. That desynchronization
//! is a caller responsibility, usually discharged once per tick.

use std::any::TypeId;
use std::marker::PhantomData;
use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;

use silt_arena::{AnyHandle, VoidHandle};
use silt_core::traits::{Component, ComponentSource, QueryArena};
use silt_core::{ArenaId, TypeSet};

use crate::error::GroupError;
use crate::segment::{ArenaSegment, SlotKey};

/// An aggregation of arenas behind one membership and iteration surface.
pub struct GroupContainer {
    /// Segments in arena-registration order.
    segments: Vec<ArenaSegment>,
    /// Arena identity → position in `segments`.
    by_arena: IndexMap<ArenaId, usize>,
}

impl GroupContainer {
    /// Create an empty group.
    pub fn new() -> Self {
        Self {
            segments: Vec::new(),
            by_arena: IndexMap::new(),
        }
    }

    /// Register an arena as a participant in this group.
    ///
    /// Setup-time only; registering the same arena twice is an error.
    pub fn add_arena(&mut self, arena: Arc<dyn QueryArena>) -> Result<(), GroupError> {
        let id = arena.arena_id();
        if self.by_arena.contains_key(&id) {
            return Err(GroupError::DuplicateArena { id });
        }
        self.by_arena.insert(id, self.segments.len());
        self.segments.push(ArenaSegment::new(arena));
        debug!("group: arena {id} joined ({} total)", self.segments.len());
        Ok(())
    }

    /// Number of participating arenas.
    pub fn arena_count(&self) -> usize {
        self.segments.len()
    }

    /// The per-arena segments, in registration order.
    pub fn segments(&self) -> &[ArenaSegment] {
        &self.segments
    }

    /// Track a handle in its owning segment.
    ///
    /// Returns `false` if the handle's arena is not part of this group,
    /// or if the exact `(index, generation)` entry is already tracked —
    /// adding twice is an idempotent no-op, not an error.
    pub fn add(&mut self, handle: &AnyHandle) -> bool {
        let Some(&position) = self.by_arena.get(&handle.arena_id()) else {
            return false;
        };
        self.segments[position].insert(SlotKey::of(handle))
    }

    /// Stop tracking a handle.
    ///
    /// Returns `false` if the entry was never added or already removed —
    /// idempotent, not an error.
    pub fn remove(&mut self, handle: &AnyHandle) -> bool {
        let Some(&position) = self.by_arena.get(&handle.arena_id()) else {
            return false;
        };
        self.segments[position].remove(SlotKey::of(handle))
    }

    /// Whether the exact entry for `handle` is tracked.
    pub fn contains(&self, handle: &AnyHandle) -> bool {
        self.by_arena
            .get(&handle.arena_id())
            .is_some_and(|&position| self.segments[position].contains(SlotKey::of(handle)))
    }

    /// Sweep out entries whose backing slot is no longer valid.
    ///
    /// One linear pass per segment; relative order is preserved.
    pub fn compact(&mut self) {
        let removed: usize = self.segments.iter_mut().map(ArenaSegment::compact).sum();
        if removed > 0 {
            debug!("group: compacted {removed} stale entries");
        }
    }

    /// Total tracked entries, live or stale.
    pub fn count(&self) -> usize {
        self.segments.iter().map(ArenaSegment::len).sum()
    }

    /// Tracked entries whose backing slot is currently valid.
    pub fn active_count(&self) -> usize {
        self.segments.iter().map(ArenaSegment::active_count).sum()
    }

    /// Iterate every tracked entry as an [`AnyHandle`].
    ///
    /// Allocation-free; yields entries segment by segment, each
    /// segment's entries in sorted order.
    pub fn iter(&self) -> GroupIter<'_> {
        self.iter_from(0)
    }

    /// Iterate starting `offset` entries in, for chunked consumption.
    ///
    /// `iter_from(k)` yields exactly the entries `iter` would after
    /// skipping `k`, but positions itself in O(segments) instead of
    /// stepping entry by entry.
    pub fn iter_from(&self, offset: usize) -> GroupIter<'_> {
        let mut segment = 0;
        let mut entry = offset;
        while let Some(s) = self.segments.get(segment) {
            if entry < s.len() {
                break;
            }
            entry -= s.len();
            segment += 1;
        }
        GroupIter {
            segments: &self.segments,
            segment,
            entry,
        }
    }

    /// A read-only view filtered to entities carrying every component
    /// in `Q`.
    ///
    /// The view stores only the component type set and a reference to
    /// the segment list; nothing is materialized until iteration, and
    /// iteration allocates nothing.
    pub fn query<Q: ComponentSet>(&self) -> GroupQuery<'_, Q> {
        GroupQuery {
            segments: &self.segments,
            types: Q::type_ids(),
            _marker: PhantomData,
        }
    }
}

impl Default for GroupContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> IntoIterator for &'a GroupContainer {
    type Item = AnyHandle;
    type IntoIter = GroupIter<'a>;

    fn into_iter(self) -> GroupIter<'a> {
        self.iter()
    }
}

/// Allocation-free traversal over a group's tracked entries.
pub struct GroupIter<'a> {
    segments: &'a [ArenaSegment],
    segment: usize,
    entry: usize,
}

impl Iterator for GroupIter<'_> {
    type Item = AnyHandle;

    fn next(&mut self) -> Option<AnyHandle> {
        while let Some(segment) = self.segments.get(self.segment) {
            if let Some(&key) = segment.entries().get(self.entry) {
                self.entry += 1;
                return Some(segment.any_handle(key));
            }
            self.segment += 1;
            self.entry = 0;
        }
        None
    }
}

/// A set of component types a group query filters by.
///
/// Implemented for tuples of up to four [`Component`] types. Queries
/// over a single component use a one-element tuple: `(Position,)`.
pub trait ComponentSet {
    /// The `TypeId`s of every component in the set.
    fn type_ids() -> TypeSet;
}

macro_rules! impl_component_set {
    ($($component:ident),+) => {
        impl<$($component: Component),+> ComponentSet for ($($component,)+) {
            fn type_ids() -> TypeSet {
                let mut ids = TypeSet::new();
                $(ids.push(TypeId::of::<$component>());)+
                ids
            }
        }
    };
}

impl_component_set!(C1);
impl_component_set!(C1, C2);
impl_component_set!(C1, C2, C3);
impl_component_set!(C1, C2, C3, C4);

/// A lazy, read-only component-filtered view over a group.
///
/// Holds the filter type set and the segment list, nothing else.
pub struct GroupQuery<'a, Q> {
    segments: &'a [ArenaSegment],
    types: TypeSet,
    _marker: PhantomData<fn() -> Q>,
}

impl<'a, Q: ComponentSet> GroupQuery<'a, Q> {
    /// Iterate matching entries as [`VoidHandle`]s.
    ///
    /// A segment matches when its arena has a registered store for every
    /// component in `Q`; the check runs once per segment, not per entry.
    /// Entry validity is not re-checked here — component access through
    /// the yielded handles re-validates anyway.
    pub fn iter(&self) -> GroupQueryIter<'_> {
        GroupQueryIter {
            segments: self.segments,
            types: &self.types,
            segment: 0,
            entry: 0,
        }
    }
}

impl<'a, Q: ComponentSet> IntoIterator for &'a GroupQuery<'a, Q> {
    type Item = VoidHandle;
    type IntoIter = GroupQueryIter<'a>;

    fn into_iter(self) -> GroupQueryIter<'a> {
        self.iter()
    }
}

/// Iterator over a [`GroupQuery`]'s matching entries.
pub struct GroupQueryIter<'a> {
    segments: &'a [ArenaSegment],
    types: &'a TypeSet,
    segment: usize,
    entry: usize,
}

impl GroupQueryIter<'_> {
    fn segment_matches(&self, segment: &ArenaSegment) -> bool {
        self.types
            .iter()
            .all(|ty| segment.arena().has_component(*ty))
    }
}

impl Iterator for GroupQueryIter<'_> {
    type Item = VoidHandle;

    fn next(&mut self) -> Option<VoidHandle> {
        while let Some(segment) = self.segments.get(self.segment) {
            if self.entry == 0 && !self.segment_matches(segment) {
                self.segment += 1;
                continue;
            }
            if let Some(&key) = segment.entries().get(self.entry) {
                self.entry += 1;
                return Some(segment.void_handle(key));
            }
            self.segment += 1;
            self.entry = 0;
        }
        None
    }
}
