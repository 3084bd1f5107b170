//! The generational slot allocator.
//!
//! [`GenerationalArena`] owns dense slot storage with parallel generation
//! counters and a free list. Allocation reuses the most recently freed
//! slot when one exists, otherwise appends, doubling the dense storage
//! geometrically when it is full. Deallocation is guarded by an exact
//! generation match, which is what turns stale handles into harmless
//! `false`/`None` results instead of use-after-free bugs.

use std::any::{Any, TypeId};
use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use log::debug;
use parking_lot::{
    MappedRwLockReadGuard, MappedRwLockWriteGuard, RwLock, RwLockReadGuard, RwLockWriteGuard,
};

use silt_core::traits::{Component, ComponentSource, QueryArena, SlotAccess};
use silt_core::ArenaId;

use crate::component::ComponentArena;
use crate::config::{ArenaBuilder, LifecycleHook};
use crate::handle::Handle;

/// Generation assigned to a slot the first time it enters service.
///
/// Starting above zero keeps the all-zeroes handle permanently invalid.
const FIRST_GENERATION: u32 = 1;

/// One reusable storage cell.
struct Slot<T> {
    value: T,
    generation: u32,
    active: bool,
}

impl<T: Default> Slot<T> {
    fn fresh() -> Self {
        Self {
            value: T::default(),
            generation: FIRST_GENERATION,
            active: true,
        }
    }
}

/// The lock-guarded interior of an arena.
struct SlotStore<T> {
    slots: Vec<Slot<T>>,
    /// Indices of inactive slots, most recently freed last.
    free: Vec<u32>,
    active: usize,
}

/// A slot allocator handing out stable, checkable references.
///
/// Values live in dense storage; each slot carries a generation counter
/// that increments on every deallocation. A handle is valid exactly while
/// the slot it names is active at the generation it was minted with.
///
/// Arenas are constructed via [`GenerationalArena::builder`] and always
/// live behind an `Arc`, because handles carry a reference to their
/// owning arena.
///
/// # Locking
///
/// A single `RwLock` guards the slot store. `allocate`, `deallocate`, and
/// every checked accessor take it; callers needing an atomic
/// allocate-then-initialize sequence get it for free because the spawn
/// hook runs under the same lock acquisition as the allocation itself.
/// [`GenerationalArena::get_unchecked`] bypasses the lock and is `unsafe`.
pub struct GenerationalArena<T> {
    id: ArenaId,
    store: RwLock<SlotStore<T>>,
    /// Registration table: component type → erased [`ComponentArena`].
    components: RwLock<IndexMap<TypeId, Arc<dyn Any + Send + Sync>>>,
    on_spawn: Option<LifecycleHook<T>>,
    on_despawn: Option<LifecycleHook<T>>,
    /// Back-reference used to mint handles from `&self`.
    weak_self: Weak<GenerationalArena<T>>,
}

impl<T> GenerationalArena<T> {
    /// Start building an arena.
    pub fn builder() -> ArenaBuilder<T> {
        ArenaBuilder::new()
    }

    pub(crate) fn from_builder(builder: ArenaBuilder<T>) -> Arc<Self> {
        Arc::new_cyclic(|weak_self| Self {
            id: ArenaId::next(),
            store: RwLock::new(SlotStore {
                slots: Vec::with_capacity(builder.capacity),
                free: Vec::new(),
                active: 0,
            }),
            components: RwLock::new(IndexMap::new()),
            on_spawn: builder.on_spawn,
            on_despawn: builder.on_despawn,
            weak_self: weak_self.clone(),
        })
    }

    /// Unique identity of this arena instance.
    pub fn id(&self) -> ArenaId {
        self.id
    }

    /// Number of currently active slots.
    pub fn len(&self) -> usize {
        self.store.read().active
    }

    /// Whether no slots are active.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slots the arena can hold before the next growth.
    pub fn capacity(&self) -> usize {
        self.store.read().slots.capacity()
    }

    /// Allocate a slot and return its handle.
    ///
    /// Reuses the most recently freed slot if any, else appends to the
    /// dense storage, doubling its capacity when full. Growth preserves
    /// every existing index and generation — slots are copied, never
    /// remapped. A reused slot keeps the value it held when it was
    /// deallocated; the spawn hook is the re-initialization point and
    /// runs before the handle is returned, under the arena lock.
    pub fn allocate(&self) -> Handle<T>
    where
        T: Default,
    {
        let mut store = self.store.write();
        let (index, generation) = match store.free.pop() {
            Some(index) => {
                let slot = &mut store.slots[index as usize];
                slot.active = true;
                (index, slot.generation)
            }
            None => {
                if store.slots.len() == store.slots.capacity() {
                    let additional = store.slots.capacity().max(1);
                    store.slots.reserve_exact(additional);
                    debug!(
                        "arena {}: dense storage grew to {} slots",
                        self.id,
                        store.slots.capacity()
                    );
                }
                let index = store.slots.len() as u32;
                store.slots.push(Slot::fresh());
                (index, FIRST_GENERATION)
            }
        };
        store.active += 1;
        if let Some(hook) = &self.on_spawn {
            hook(generation, &mut store.slots[index as usize].value);
        }
        drop(store);
        self.mint(index, generation)
    }

    /// Deallocate the slot a handle names.
    ///
    /// Returns `false` if the handle belongs to another arena, its index
    /// is out of range, or its generation no longer matches — the
    /// use-after-free guard. Never panics.
    pub fn deallocate(&self, handle: &Handle<T>) -> bool {
        handle.arena_id() == self.id && self.deallocate_raw(handle.index(), handle.generation())
    }

    /// Raw-index form of [`GenerationalArena::deallocate`], backing the
    /// erased [`Spawner`](crate::spawn::Spawner) surface.
    ///
    /// On success the despawn hook runs first, while the slot's current
    /// generation is still the one the caller named; only then does the
    /// generation increment and the index return to the free list.
    pub fn deallocate_raw(&self, index: u32, generation: u32) -> bool {
        let mut store = self.store.write();
        let Some(slot) = store.slots.get_mut(index as usize) else {
            return false;
        };
        if !slot.active || slot.generation != generation {
            return false;
        }
        if let Some(hook) = &self.on_despawn {
            hook(slot.generation, &mut slot.value);
        }
        slot.active = false;
        slot.generation += 1;
        store.free.push(index);
        store.active -= 1;
        true
    }

    /// Whether a handle still names the live incarnation of its slot.
    ///
    /// Recomputed against the slot store on every call; handles are
    /// snapshotted identities, never caches.
    pub fn is_valid(&self, handle: &Handle<T>) -> bool {
        handle.arena_id() == self.id && self.is_valid_raw(handle.index(), handle.generation())
    }

    /// Raw-index form of [`GenerationalArena::is_valid`], backing the
    /// erased [`SlotAccess`] surface.
    ///
    /// Acquires the lock with `read_recursive` so it stays callable from
    /// inside a [`QueryArena::for_each_slot`] visitor, which already
    /// holds a read guard on the same lock.
    pub fn is_valid_raw(&self, index: u32, generation: u32) -> bool {
        self.store
            .read_recursive()
            .slots
            .get(index as usize)
            .is_some_and(|slot| slot.active && slot.generation == generation)
    }

    /// Whether the slot at `index` is currently active, at any generation.
    pub fn is_active(&self, index: u32) -> bool {
        self.store
            .read_recursive()
            .slots
            .get(index as usize)
            .is_some_and(|slot| slot.active)
    }

    /// Current generation of the slot at `index`, active or not.
    ///
    /// Returns `None` for out-of-range indices.
    pub fn generation_of(&self, index: u32) -> Option<u32> {
        self.store
            .read_recursive()
            .slots
            .get(index as usize)
            .map(|slot| slot.generation)
    }

    /// Number of slots in the dense storage, active or not.
    pub fn slot_count(&self) -> usize {
        self.store.read_recursive().slots.len()
    }

    /// Borrow the value a handle names, if it is still valid.
    ///
    /// Holds the arena's read lock for the guard's lifetime.
    pub fn try_get(&self, handle: &Handle<T>) -> Option<MappedRwLockReadGuard<'_, T>> {
        if handle.arena_id() != self.id {
            return None;
        }
        let store = self.store.read();
        RwLockReadGuard::try_map(store, |s| {
            s.slots
                .get(handle.index() as usize)
                .filter(|slot| slot.active && slot.generation == handle.generation())
                .map(|slot| &slot.value)
        })
        .ok()
    }

    /// Mutably borrow the value a handle names, if it is still valid.
    ///
    /// Holds the arena's write lock for the guard's lifetime.
    pub fn try_get_mut(&self, handle: &Handle<T>) -> Option<MappedRwLockWriteGuard<'_, T>> {
        if handle.arena_id() != self.id {
            return None;
        }
        let store = self.store.write();
        RwLockWriteGuard::try_map(store, |s| {
            s.slots
                .get_mut(handle.index() as usize)
                .filter(|slot| slot.active && slot.generation == handle.generation())
                .map(|slot| &mut slot.value)
        })
        .ok()
    }

    /// Run `f` against the value a handle names, if it is still valid.
    pub fn with<R>(&self, handle: &Handle<T>, f: impl FnOnce(&T) -> R) -> Option<R> {
        self.try_get(handle).map(|guard| f(&guard))
    }

    /// Mutable closure form of [`GenerationalArena::with`].
    pub fn with_mut<R>(&self, handle: &Handle<T>, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        self.try_get_mut(handle).map(|mut guard| f(&mut guard))
    }

    /// Access a slot's value without the generation check or the lock.
    ///
    /// This is the performance escape hatch for tight per-tick loops
    /// that have already proved the slot alive this tick. It reads
    /// through the lock's data pointer without acquiring it.
    ///
    /// # Safety
    ///
    /// The caller must guarantee, for the full lifetime of the returned
    /// reference, that no other access to this arena occurs — the
    /// single-writer-per-tick discipline. A prior validity check for
    /// `index` this tick is required; `index` must be in range. Violating
    /// either is undefined behavior, not a checked error.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn get_unchecked(&self, index: u32) -> &mut T {
        let store = unsafe { &mut *self.store.data_ptr() };
        &mut store.slots[index as usize].value
    }

    /// Register (or fetch) the component store for `C`.
    ///
    /// Component registration is explicit and idempotent: the first call
    /// for a given `C` creates the parallel store and enters it into the
    /// arena's registration table; later calls return the same store.
    /// The table is what [`VoidHandle::try_execute`](crate::handle::VoidHandle::try_execute)
    /// resolves against.
    pub fn register_component<C: Component>(self: &Arc<Self>) -> Arc<ComponentArena<C>>
    where
        T: Send + Sync + 'static,
    {
        let mut components = self.components.write();
        if let Some(existing) = components.get(&TypeId::of::<C>()) {
            return Arc::clone(existing)
                .downcast::<ComponentArena<C>>()
                .expect("registry entries match their TypeId key");
        }
        let owner_strong: Arc<dyn SlotAccess> = self.clone();
        let owner: Weak<dyn SlotAccess> = Arc::downgrade(&owner_strong);
        let store = Arc::new(ComponentArena::new(owner, self.store.read().slots.len()));
        let erased: Arc<dyn Any + Send + Sync> = store.clone();
        components.insert(TypeId::of::<C>(), erased);
        debug!(
            "arena {}: registered component store for {}",
            self.id,
            std::any::type_name::<C>()
        );
        store
    }

    fn mint(&self, index: u32, generation: u32) -> Handle<T> {
        let arena = self
            .weak_self
            .upgrade()
            .expect("arenas are only constructed behind an Arc");
        Handle::new(arena, index, generation)
    }
}

impl<T: Send + Sync> SlotAccess for GenerationalArena<T> {
    fn arena_id(&self) -> ArenaId {
        self.id
    }

    fn slot_count(&self) -> usize {
        GenerationalArena::slot_count(self)
    }

    fn active_count(&self) -> usize {
        self.store.read_recursive().active
    }

    fn is_active(&self, index: u32) -> bool {
        GenerationalArena::is_active(self, index)
    }

    fn is_valid_raw(&self, index: u32, generation: u32) -> bool {
        GenerationalArena::is_valid_raw(self, index, generation)
    }

    fn generation_of(&self, index: u32) -> Option<u32> {
        GenerationalArena::generation_of(self, index)
    }
}

impl<T: Send + Sync + 'static> ComponentSource for GenerationalArena<T> {
    fn component_store(&self, component: TypeId) -> Option<Arc<dyn Any + Send + Sync>> {
        self.components.read().get(&component).cloned()
    }
}

impl<T: Send + Sync + 'static> QueryArena for GenerationalArena<T> {
    fn entity_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn for_each_slot(&self, visitor: &mut dyn FnMut(u32, u32) -> bool) {
        let store = self.store.read();
        for (index, slot) in store.slots.iter().enumerate() {
            if slot.active && !visitor(index as u32, slot.generation) {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn allocate_returns_valid_handle() {
        let arena = GenerationalArena::<u32>::builder().build();
        let h = arena.allocate();
        assert!(arena.is_valid(&h));
        assert_eq!(h.generation(), 1);
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn deallocate_invalidates_handle() {
        let arena = GenerationalArena::<u32>::builder().build();
        let h = arena.allocate();
        assert!(arena.deallocate(&h));
        assert!(!arena.is_valid(&h));
        assert!(arena.try_get(&h).is_none());
        assert_eq!(arena.len(), 0);
    }

    #[test]
    fn deallocate_is_rejected_twice() {
        let arena = GenerationalArena::<u32>::builder().build();
        let h = arena.allocate();
        assert!(arena.deallocate(&h));
        assert!(!arena.deallocate(&h));
    }

    #[test]
    fn stale_handle_stays_invalid_after_reuse() {
        let arena = GenerationalArena::<u32>::builder().capacity(1).build();
        let old = arena.allocate();
        arena.deallocate(&old);
        let new = arena.allocate();
        // Same slot, new incarnation.
        assert_eq!(old.index(), new.index());
        assert!(new.generation() > old.generation());
        assert!(!arena.is_valid(&old));
        assert!(arena.is_valid(&new));
        assert_ne!(old, new);
    }

    #[test]
    fn reuse_round_trip_same_indices_generation_two() {
        let arena = GenerationalArena::<u32>::builder().capacity(4).build();
        let first: Vec<_> = (0..4).map(|_| arena.allocate()).collect();
        for h in &first {
            assert_eq!(h.generation(), 1);
            assert!(arena.deallocate(h));
        }
        let second: Vec<_> = (0..4).map(|_| arena.allocate()).collect();
        let mut old_indices: Vec<_> = first.iter().map(|h| h.index()).collect();
        let mut new_indices: Vec<_> = second.iter().map(|h| h.index()).collect();
        old_indices.sort_unstable();
        new_indices.sort_unstable();
        assert_eq!(old_indices, new_indices, "all four slots reused");
        assert!(second.iter().all(|h| h.generation() == 2));
    }

    #[test]
    fn growth_preserves_existing_handles_and_values() {
        let arena = GenerationalArena::<u32>::builder().capacity(2).build();
        let handles: Vec<_> = (0..2).map(|_| arena.allocate()).collect();
        for (i, h) in handles.iter().enumerate() {
            arena.with_mut(h, |v| *v = i as u32 + 10).unwrap();
        }
        // Exceed the initial capacity.
        let extra: Vec<_> = (0..5).map(|_| arena.allocate()).collect();
        assert!(arena.capacity() >= 7);
        for (i, h) in handles.iter().enumerate() {
            assert!(arena.is_valid(h));
            assert_eq!(arena.with(h, |v| *v).unwrap(), i as u32 + 10);
        }
        for h in &extra {
            assert!(arena.is_valid(h));
        }
    }

    #[test]
    fn spawn_hook_runs_before_handle_returns() {
        let arena = GenerationalArena::<u32>::builder()
            .on_spawn(|_, value| *value = 99)
            .build();
        let h = arena.allocate();
        assert_eq!(arena.with(&h, |v| *v).unwrap(), 99);
    }

    #[test]
    fn despawn_hook_observes_pre_increment_generation() {
        let seen: Arc<Mutex<Vec<u32>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let arena = GenerationalArena::<u32>::builder()
            .on_despawn(move |generation, _| sink.lock().push(generation))
            .build();
        let h = arena.allocate();
        assert!(arena.deallocate(&h));
        // The hook saw the generation the caller named, not the
        // post-increment value the slot now carries.
        assert_eq!(seen.lock().as_slice(), &[h.generation()]);
        assert_eq!(arena.generation_of(h.index()), Some(h.generation() + 1));
    }

    #[test]
    fn reused_slot_keeps_value_until_hook_rewrites_it() {
        let arena = GenerationalArena::<u32>::builder().capacity(1).build();
        let h = arena.allocate();
        arena.with_mut(&h, |v| *v = 7).unwrap();
        arena.deallocate(&h);
        let h2 = arena.allocate();
        // Pool semantics: no hook installed, so the old value survives.
        assert_eq!(arena.with(&h2, |v| *v).unwrap(), 7);
    }

    #[test]
    fn foreign_handle_is_rejected() {
        let a = GenerationalArena::<u32>::builder().build();
        let b = GenerationalArena::<u32>::builder().build();
        let h = a.allocate();
        assert!(!b.is_valid(&h));
        assert!(!b.deallocate(&h));
        assert!(b.try_get(&h).is_none());
        assert!(a.is_valid(&h));
    }

    #[test]
    fn get_unchecked_reads_live_value() {
        let arena = GenerationalArena::<u32>::builder().build();
        let h = arena.allocate();
        arena.with_mut(&h, |v| *v = 41).unwrap();
        // Sole owner, no concurrent access: the contract holds.
        let value = unsafe { arena.get_unchecked(h.index()) };
        *value += 1;
        assert_eq!(arena.with(&h, |v| *v).unwrap(), 42);
    }

    #[test]
    fn register_component_is_idempotent() {
        let arena = GenerationalArena::<u32>::builder().build();
        let a = arena.register_component::<f32>();
        let b = arena.register_component::<f32>();
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn generations_strictly_increase_per_slot(cycles in 1usize..20) {
                let arena = GenerationalArena::<u32>::builder().capacity(1).build();
                let mut last = 0u32;
                for _ in 0..cycles {
                    let h = arena.allocate();
                    prop_assert_eq!(h.index(), 0, "single slot is always reused");
                    prop_assert!(h.generation() > last);
                    last = h.generation();
                    arena.deallocate(&h);
                }
            }

            #[test]
            fn active_count_tracks_live_slots(ops in proptest::collection::vec(any::<bool>(), 1..40)) {
                let arena = GenerationalArena::<u32>::builder().build();
                let mut live = Vec::new();
                for allocate in ops {
                    if allocate || live.is_empty() {
                        live.push(arena.allocate());
                    } else {
                        let h = live.pop().unwrap();
                        prop_assert!(arena.deallocate(&h));
                    }
                    prop_assert_eq!(arena.len(), live.len());
                }
                for h in &live {
                    prop_assert!(arena.is_valid(h));
                }
            }

            #[test]
            fn validity_matches_slot_state(deallocate_mask in proptest::collection::vec(any::<bool>(), 8)) {
                let arena = GenerationalArena::<u32>::builder().capacity(8).build();
                let handles: Vec<_> = (0..8).map(|_| arena.allocate()).collect();
                for (h, kill) in handles.iter().zip(&deallocate_mask) {
                    if *kill {
                        arena.deallocate(h);
                    }
                }
                for (h, killed) in handles.iter().zip(&deallocate_mask) {
                    prop_assert_eq!(arena.is_valid(h), !*killed);
                }
            }
        }
    }
}
