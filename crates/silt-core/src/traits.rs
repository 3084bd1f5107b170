//! Type-erased access traits implemented by concrete arenas.
//!
//! These traits are the seam between the typed arena storage in
//! `silt-arena` and the heterogeneous machinery in `silt-query`: group
//! containers and the query executor hold arenas as trait objects and
//! never name a concrete entity type. All methods here are read-only —
//! containers observe arena state but mutation rights stay with whoever
//! owns the arena itself.

use std::any::{Any, TypeId};
use std::sync::Arc;

use smallvec::SmallVec;

use crate::id::ArenaId;

/// A set of component types named by a query.
///
/// Uses `SmallVec<[TypeId; 4]>` to avoid heap allocation for queries over
/// up to four component types, which covers every query shape the engine
/// supports. Larger sets spill to the heap transparently.
pub type TypeSet = SmallVec<[TypeId; 4]>;

/// Marker for types usable as per-entity components.
///
/// Blanket-implemented; the bound exists so component store signatures
/// read as intent rather than as a pile of auto-trait bounds. `Default`
/// is required because component storage grows in lockstep with its
/// owning arena and fills new slots with default values.
pub trait Component: Default + Send + Sync + 'static {}

impl<C: Default + Send + Sync + 'static> Component for C {}

/// Read-only slot bookkeeping exposed by every arena.
///
/// This is the narrowest erased view of an arena: enough to check whether
/// a `(index, generation)` pair still names a live slot, and to size
/// parallel storage. Implementors take the arena's internal lock for each
/// call, so results are point-in-time observations.
pub trait SlotAccess: Send + Sync {
    /// Unique identity of this arena instance.
    fn arena_id(&self) -> ArenaId;

    /// Number of slots in the dense storage, active or not.
    ///
    /// Parallel component stores size themselves to this value.
    fn slot_count(&self) -> usize;

    /// Number of currently active slots.
    fn active_count(&self) -> usize;

    /// Whether the slot at `index` is currently active.
    ///
    /// Out-of-range indices are inactive, not an error.
    fn is_active(&self, index: u32) -> bool;

    /// Whether `(index, generation)` names the live incarnation of a slot.
    ///
    /// True iff the slot is active and its current generation equals
    /// `generation` exactly. This is the use-after-free guard: once a slot
    /// is deallocated its generation moves on, and every stale pair is
    /// rejected here forever.
    fn is_valid_raw(&self, index: u32, generation: u32) -> bool;

    /// Current generation of the slot at `index`, active or not.
    ///
    /// Returns `None` for out-of-range indices.
    fn generation_of(&self, index: u32) -> Option<u32>;
}

/// An arena that can resolve type-erased component stores.
///
/// The arena keeps an explicit registration table from component
/// `TypeId` to the erased store. Registration happens at setup time;
/// lookups are how speculative cross-type dispatch
/// (`VoidHandle::try_execute`) discovers whether an entity kind carries a
/// component at all.
pub trait ComponentSource: SlotAccess {
    /// Look up the erased component store for `component`.
    ///
    /// Returns `None` if no store for that component type was registered
    /// with this arena — a normal outcome, not a fault.
    fn component_store(&self, component: TypeId) -> Option<Arc<dyn Any + Send + Sync>>;

    /// Whether a store for `component` is registered with this arena.
    fn has_component(&self, component: TypeId) -> bool {
        self.component_store(component).is_some()
    }
}

/// The contract consumed by the query executor and group containers.
///
/// Adds active-slot enumeration and the concrete entity type to the
/// erased surface. The trait object itself serves as the underlying-arena
/// reference: anything holding an `Arc<dyn QueryArena>` can reach the
/// whole erased surface through upcasting.
pub trait QueryArena: ComponentSource {
    /// `TypeId` of the concrete entity type stored in this arena.
    ///
    /// Used by `of_type` query filters to restrict a query to one
    /// registered arena kind.
    fn entity_type(&self) -> TypeId;

    /// Visit every active slot as `(index, generation)`.
    ///
    /// The visitor returns `false` to stop early. The arena's read lock
    /// is held for the duration of the walk, so visitors must be cheap
    /// and must not allocate or deallocate entities in this arena.
    fn for_each_slot(&self, visitor: &mut dyn FnMut(u32, u32) -> bool);
}

/// Typed access to one component store, independent of the entity type.
///
/// Cross-component method dispatch consumes this rather than the concrete
/// store type, so a caller holding several entity kinds can fetch the
/// same component from each through one interface.
pub trait ComponentAccess<C>: Send + Sync {
    /// Run `f` against the component at `index` if the owning slot is active.
    ///
    /// Returns `false` without invoking `f` when the slot is inactive,
    /// out of range, or the owning arena is gone.
    fn try_get_with(&self, index: u32, f: &mut dyn FnMut(&C)) -> bool;

    /// Mutable variant of [`ComponentAccess::try_get_with`].
    fn try_get_mut_with(&self, index: u32, f: &mut dyn FnMut(&mut C)) -> bool;
}
