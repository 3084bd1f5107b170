//! Arena construction parameters.

use std::sync::Arc;

use crate::arena::GenerationalArena;

/// Lifecycle hook invoked on spawn and despawn.
///
/// Receives the slot's generation and a mutable reference to the pooled
/// value. On spawn the generation is the one the returned handle will
/// carry; on despawn it is the pre-increment generation — the same
/// identity the caller asked to deallocate, observed before it goes
/// permanently stale.
pub type LifecycleHook<T> = Box<dyn Fn(u32, &mut T) + Send + Sync>;

/// Builder for [`GenerationalArena`].
///
/// All parameters are fixed at construction; the hooks in particular are
/// immutable for the arena's lifetime.
pub struct ArenaBuilder<T> {
    pub(crate) capacity: usize,
    pub(crate) on_spawn: Option<LifecycleHook<T>>,
    pub(crate) on_despawn: Option<LifecycleHook<T>>,
}

impl<T> ArenaBuilder<T> {
    /// Default initial slot capacity.
    pub const DEFAULT_CAPACITY: usize = 64;

    pub(crate) fn new() -> Self {
        Self {
            capacity: Self::DEFAULT_CAPACITY,
            on_spawn: None,
            on_despawn: None,
        }
    }

    /// Set the initial slot capacity.
    ///
    /// The arena grows past this by geometric doubling; capacity only
    /// controls how many allocations happen before the first growth.
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    /// Install the spawn hook, run under the arena lock before
    /// `allocate` returns its handle.
    pub fn on_spawn(mut self, hook: impl Fn(u32, &mut T) + Send + Sync + 'static) -> Self {
        self.on_spawn = Some(Box::new(hook));
        self
    }

    /// Install the despawn hook, run under the arena lock while the
    /// slot's pre-increment generation is still current.
    pub fn on_despawn(mut self, hook: impl Fn(u32, &mut T) + Send + Sync + 'static) -> Self {
        self.on_despawn = Some(Box::new(hook));
        self
    }

    /// Construct the arena.
    ///
    /// Arenas are always built behind an `Arc` so that handles can carry
    /// a reference back to their owner.
    pub fn build(self) -> Arc<GenerationalArena<T>> {
        GenerationalArena::from_builder(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_capacity_applies() {
        let arena = ArenaBuilder::<u32>::new().build();
        assert_eq!(arena.capacity(), ArenaBuilder::<u32>::DEFAULT_CAPACITY);
    }

    #[test]
    fn explicit_capacity_applies() {
        let arena = ArenaBuilder::<u32>::new().capacity(4).build();
        assert_eq!(arena.capacity(), 4);
    }
}
