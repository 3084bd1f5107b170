//! Typed and type-erased slot references.
//!
//! A handle is a weak identity: `(arena, index, generation)`. It never
//! keeps the slot alive and never caches validity — every `is_valid`
//! call asks the owning arena again. Two handles are equal only when all
//! three fields agree, so references from different reuse cycles of the
//! same slot never compare equal.
//!
//! [`Handle`] knows its concrete entity type. [`AnyHandle`] and
//! [`VoidHandle`] hold the arena behind an interface instead, which is
//! the mechanism for iterating mixed collections and for component
//! access across entity types.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use silt_core::traits::{Component, ComponentSource, SlotAccess};
use silt_core::ArenaId;

use crate::arena::GenerationalArena;
use crate::component::ComponentArena;

/// A typed reference to a slot in one [`GenerationalArena`].
///
/// Minted only by the owning arena, so a handle's index can never be
/// forged into existence by user code. Cloning is cheap (one reference
/// count bump); clones are interchangeable identities.
pub struct Handle<T> {
    arena: Arc<GenerationalArena<T>>,
    index: u32,
    generation: u32,
}

impl<T> Handle<T> {
    pub(crate) fn new(arena: Arc<GenerationalArena<T>>, index: u32, generation: u32) -> Self {
        Self {
            arena,
            index,
            generation,
        }
    }

    /// Slot index within the owning arena.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation this handle was minted with.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Identity of the owning arena.
    pub fn arena_id(&self) -> ArenaId {
        self.arena.id()
    }

    /// The owning arena.
    pub fn arena(&self) -> &Arc<GenerationalArena<T>> {
        &self.arena
    }

    /// Whether this handle still names the live incarnation of its slot.
    ///
    /// Recomputed against the arena on every call, never cached.
    pub fn is_valid(&self) -> bool {
        self.arena.is_valid(self)
    }
}

impl<T: Send + Sync + 'static> Handle<T> {
    /// Widen to an [`AnyHandle`] for mixed-collection use.
    pub fn to_any(&self) -> AnyHandle {
        let arena: Arc<dyn SlotAccess> = self.arena.clone();
        AnyHandle {
            arena,
            index: self.index,
            generation: self.generation,
        }
    }

    /// Widen to a [`VoidHandle`] for cross-type component dispatch.
    pub fn to_void(&self) -> VoidHandle {
        let arena: Arc<dyn ComponentSource> = self.arena.clone();
        VoidHandle {
            arena,
            index: self.index,
            generation: self.generation,
        }
    }
}

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        Self {
            arena: Arc::clone(&self.arena),
            index: self.index,
            generation: self.generation,
        }
    }
}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.arena.id() == other.arena.id()
            && self.index == other.index
            && self.generation == other.generation
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.arena.id().hash(state);
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl<T> fmt::Display for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Handle(arena={}, index={}, gen={})",
            self.arena.id(),
            self.index,
            self.generation
        )
    }
}

/// A type-erased reference to a slot in some arena.
///
/// Carries the same three logical fields as [`Handle`], with the arena
/// held behind [`SlotAccess`]. This is what group containers and the
/// query executor traffic in when the concrete entity type is not
/// statically known.
#[derive(Clone)]
pub struct AnyHandle {
    arena: Arc<dyn SlotAccess>,
    index: u32,
    generation: u32,
}

impl AnyHandle {
    /// Rebuild a handle from an erased arena and a raw slot address.
    ///
    /// This is the integration seam for container machinery that stores
    /// `(index, generation)` pairs compactly and re-mints handles during
    /// iteration. A handle built from forged parts gains nothing: every
    /// checked accessor still re-validates against the arena. Prefer
    /// handles returned by arenas.
    pub fn from_raw_parts(arena: Arc<dyn SlotAccess>, index: u32, generation: u32) -> Self {
        Self {
            arena,
            index,
            generation,
        }
    }

    /// Slot index within the owning arena.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation this handle was minted with.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Identity of the owning arena.
    pub fn arena_id(&self) -> ArenaId {
        self.arena.arena_id()
    }

    /// The owning arena, as its erased slot surface.
    pub fn arena(&self) -> &Arc<dyn SlotAccess> {
        &self.arena
    }

    /// Whether this handle still names the live incarnation of its slot.
    pub fn is_valid(&self) -> bool {
        self.arena.is_valid_raw(self.index, self.generation)
    }
}

impl PartialEq for AnyHandle {
    fn eq(&self, other: &Self) -> bool {
        self.arena.arena_id() == other.arena.arena_id()
            && self.index == other.index
            && self.generation == other.generation
    }
}

impl Eq for AnyHandle {}

impl Hash for AnyHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.arena.arena_id().hash(state);
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl fmt::Debug for AnyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for AnyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "AnyHandle(arena={}, index={}, gen={})",
            self.arena.arena_id(),
            self.index,
            self.generation
        )
    }
}

/// A type-erased reference that can reach component storage.
///
/// Identical to [`AnyHandle`] except the arena is held behind
/// [`ComponentSource`], enabling speculative component dispatch without
/// knowing the entity type: [`VoidHandle::try_execute`] quietly returns
/// `false` when the entity kind has no such component.
#[derive(Clone)]
pub struct VoidHandle {
    arena: Arc<dyn ComponentSource>,
    index: u32,
    generation: u32,
}

impl VoidHandle {
    /// Rebuild a handle from an erased arena and a raw slot address.
    ///
    /// See [`AnyHandle::from_raw_parts`]; the same no-forging property
    /// holds.
    pub fn from_raw_parts(arena: Arc<dyn ComponentSource>, index: u32, generation: u32) -> Self {
        Self {
            arena,
            index,
            generation,
        }
    }

    /// Slot index within the owning arena.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Generation this handle was minted with.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Identity of the owning arena.
    pub fn arena_id(&self) -> ArenaId {
        self.arena.arena_id()
    }

    /// Whether this handle still names the live incarnation of its slot.
    pub fn is_valid(&self) -> bool {
        self.arena.is_valid_raw(self.index, self.generation)
    }

    /// Widen to an [`AnyHandle`].
    pub fn to_any(&self) -> AnyHandle {
        let arena: Arc<dyn SlotAccess> = self.arena.clone();
        AnyHandle {
            arena,
            index: self.index,
            generation: self.generation,
        }
    }

    /// Run `action` against this entity's `C` component, if it has one.
    ///
    /// Resolves the owning arena's registration table for a `C` store,
    /// re-checks this handle's validity, and only then invokes `action`
    /// with a mutable reference to the component. Returns `false` —
    /// without invoking `action` — when the entity kind carries no `C`,
    /// the handle is stale, or the index is out of range. "This entity
    /// has no such component" is a normal outcome here, never a panic,
    /// which is what makes speculative cross-type dispatch safe.
    pub fn try_execute<C: Component, F: FnOnce(&mut C)>(&self, action: F) -> bool {
        let Some(store) = self.arena.component_store(TypeId::of::<C>()) else {
            return false;
        };
        let Ok(store) = store.downcast::<ComponentArena<C>>() else {
            return false;
        };
        if !self.arena.is_valid_raw(self.index, self.generation) {
            return false;
        }
        store.with_mut(self.index, action).is_some()
    }
}

impl PartialEq for VoidHandle {
    fn eq(&self, other: &Self) -> bool {
        self.arena.arena_id() == other.arena.arena_id()
            && self.index == other.index
            && self.generation == other.generation
    }
}

impl Eq for VoidHandle {}

impl Hash for VoidHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.arena.arena_id().hash(state);
        self.index.hash(state);
        self.generation.hash(state);
    }
}

impl fmt::Debug for VoidHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for VoidHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "VoidHandle(arena={}, index={}, gen={})",
            self.arena.arena_id(),
            self.index,
            self.generation
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn equality_requires_all_three_fields() {
        let arena = GenerationalArena::<u32>::builder().capacity(1).build();
        let a = arena.allocate();
        let b = a.clone();
        assert_eq!(a, b);
        arena.deallocate(&a);
        let c = arena.allocate();
        // Same arena, same index, different generation.
        assert_eq!(a.index(), c.index());
        assert_ne!(a, c);
    }

    #[test]
    fn handles_from_distinct_arenas_never_equal() {
        let a = GenerationalArena::<u32>::builder().build();
        let b = GenerationalArena::<u32>::builder().build();
        let ha = a.allocate();
        let hb = b.allocate();
        assert_eq!(ha.index(), hb.index());
        assert_eq!(ha.generation(), hb.generation());
        assert_ne!(ha, hb);
    }

    #[test]
    fn hash_distinguishes_reuse_cycles() {
        let arena = GenerationalArena::<u32>::builder().capacity(1).build();
        let a = arena.allocate();
        arena.deallocate(&a);
        let b = arena.allocate();
        let set: HashSet<_> = [a.clone(), b.clone()].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn widened_handles_track_validity() {
        let arena = GenerationalArena::<u32>::builder().build();
        let h = arena.allocate();
        let any = h.to_any();
        let void = h.to_void();
        assert!(any.is_valid());
        assert!(void.is_valid());
        arena.deallocate(&h);
        assert!(!any.is_valid());
        assert!(!void.is_valid());
    }

    #[test]
    fn try_execute_without_store_is_false() {
        let arena = GenerationalArena::<u32>::builder().build();
        let h = arena.allocate();
        let mut ran = false;
        assert!(!h.to_void().try_execute(|_: &mut f32| ran = true));
        assert!(!ran);
    }

    #[test]
    fn try_execute_mutates_registered_component() {
        let arena = GenerationalArena::<u32>::builder().build();
        let positions = arena.register_component::<f32>();
        let h = arena.allocate();
        assert!(h.to_void().try_execute(|p: &mut f32| *p = 2.5));
        assert_eq!(positions.try_get(h.index()), Some(2.5));
    }

    #[test]
    fn try_execute_on_stale_handle_is_false() {
        let arena = GenerationalArena::<u32>::builder().build();
        arena.register_component::<f32>();
        let h = arena.allocate();
        let void = h.to_void();
        arena.deallocate(&h);
        assert!(!void.try_execute(|_: &mut f32| unreachable!("stale handle")));
    }

    #[test]
    fn display_carries_all_fields() {
        let arena = GenerationalArena::<u32>::builder().build();
        let h = arena.allocate();
        let text = h.to_string();
        assert!(text.contains("index=0"));
        assert!(text.contains("gen=1"));
    }
}
