//! Erased entity lifecycle for spawn-bridging code.
//!
//! Higher-level systems that create and destroy entities without knowing
//! their concrete type (wave spawners, network bridges, scripted
//! triggers) consume arenas through [`Spawner`] instead of naming
//! `GenerationalArena<T>` directly.

use silt_core::traits::Component;

use crate::arena::GenerationalArena;
use crate::handle::{AnyHandle, VoidHandle};

/// Type-erased entity creation and destruction.
pub trait Spawner: Send + Sync {
    /// Allocate an entity and return its erased handle.
    ///
    /// The arena's spawn hook has already run when this returns.
    fn spawn(&self) -> VoidHandle;

    /// Deallocate the entity an erased handle names.
    ///
    /// Returns `false` for handles from other arenas and for stale
    /// handles, exactly like the typed
    /// [`deallocate`](GenerationalArena::deallocate).
    fn despawn(&self, handle: &AnyHandle) -> bool;
}

impl<T: Component> Spawner for GenerationalArena<T> {
    fn spawn(&self) -> VoidHandle {
        self.allocate().to_void()
    }

    fn despawn(&self, handle: &AnyHandle) -> bool {
        handle.arena_id() == self.id() && self.deallocate_raw(handle.index(), handle.generation())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn spawn_then_despawn_round_trips() {
        let arena = GenerationalArena::<u32>::builder().build();
        let spawner: Arc<dyn Spawner> = arena.clone();
        let h = spawner.spawn();
        assert!(h.is_valid());
        assert!(spawner.despawn(&h.to_any()));
        assert!(!h.is_valid());
        assert!(!spawner.despawn(&h.to_any()));
    }

    #[test]
    fn despawn_rejects_foreign_handles() {
        let a = GenerationalArena::<u32>::builder().build();
        let b = GenerationalArena::<u32>::builder().build();
        let h = a.allocate();
        let spawner: &dyn Spawner = b.as_ref();
        assert!(!spawner.despawn(&h.to_any()));
        assert!(h.is_valid());
    }
}
