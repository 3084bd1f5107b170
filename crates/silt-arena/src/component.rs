//! Per-component parallel storage.
//!
//! A [`ComponentArena`] is a `Vec<C>` aligned index-for-index with its
//! owning entity arena: the component at slot `i` is meaningful exactly
//! while slot `i` of the owner is active. It keeps no generation
//! counters of its own — validity is always delegated to the owner, so a
//! component can never outlive or lag the entity it belongs to.

use std::sync::Weak;

use log::trace;
use parking_lot::RwLock;

use silt_core::traits::{Component, ComponentAccess, SlotAccess};

/// Parallel component store, index-aligned with an owning arena.
///
/// Created through
/// [`GenerationalArena::register_component`](crate::arena::GenerationalArena::register_component),
/// which also enters the store into the owner's registration table for
/// type-erased lookup. The store holds the owner weakly: once the owner
/// is gone, every checked access reports the slot invalid.
///
/// Storage grows in lockstep with the owner's slot count, filling new
/// slots with `C::default()`; growth happens lazily on access rather
/// than eagerly on owner growth, so an unused store costs nothing.
pub struct ComponentArena<C> {
    owner: Weak<dyn SlotAccess>,
    data: RwLock<Vec<C>>,
}

impl<C: Component> ComponentArena<C> {
    pub(crate) fn new(owner: Weak<dyn SlotAccess>, capacity: usize) -> Self {
        Self {
            owner,
            data: RwLock::new(Vec::with_capacity(capacity)),
        }
    }

    /// Copy out the component at `index`, if the owning slot is active.
    pub fn try_get(&self, index: u32) -> Option<C>
    where
        C: Clone,
    {
        self.with(index, C::clone)
    }

    /// Run `f` against the component at `index`, if the owning slot is
    /// active.
    ///
    /// Returns `None` without invoking `f` when the slot is inactive,
    /// out of range, or the owner arena has been dropped.
    pub fn with<R>(&self, index: u32, f: impl FnOnce(&C) -> R) -> Option<R> {
        let owner = self.owner.upgrade()?;
        if !owner.is_active(index) {
            return None;
        }
        self.grow_to(owner.slot_count());
        let data = self.data.read();
        data.get(index as usize).map(f)
    }

    /// Mutable closure form of [`ComponentArena::with`].
    pub fn with_mut<R>(&self, index: u32, f: impl FnOnce(&mut C) -> R) -> Option<R> {
        let owner = self.owner.upgrade()?;
        if !owner.is_active(index) {
            return None;
        }
        self.grow_to(owner.slot_count());
        let mut data = self.data.write();
        data.get_mut(index as usize).map(f)
    }

    /// Number of slots currently materialized in this store.
    ///
    /// At most the owner's slot count; less if the tail has never been
    /// touched.
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    /// Whether the store has materialized no slots yet.
    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Access the component at `index` without the owner validity check
    /// or the store's lock.
    ///
    /// The per-tick fast path for systems that already proved the slot
    /// alive this tick.
    ///
    /// # Safety
    ///
    /// The caller must guarantee, for the full lifetime of the returned
    /// reference, that no other access to this store occurs — the
    /// single-writer-per-tick discipline. The slot must have been
    /// materialized (a prior checked access this tick suffices) and its
    /// owner slot proved active; `index` must be in range. Violating
    /// either is undefined behavior, not a checked error.
    #[allow(clippy::mut_from_ref)]
    pub unsafe fn get_unchecked(&self, index: u32) -> &mut C {
        let data = unsafe { &mut *self.data.data_ptr() };
        &mut data[index as usize]
    }

    /// Grow the parallel vector to the owner's slot count.
    fn grow_to(&self, slot_count: usize) {
        if self.data.read().len() >= slot_count {
            return;
        }
        let mut data = self.data.write();
        if data.len() < slot_count {
            data.resize_with(slot_count, C::default);
            trace!("component store grew to {} slots", slot_count);
        }
    }
}

impl<C: Component> ComponentAccess<C> for ComponentArena<C> {
    fn try_get_with(&self, index: u32, f: &mut dyn FnMut(&C)) -> bool {
        self.with(index, |c| f(c)).is_some()
    }

    fn try_get_mut_with(&self, index: u32, f: &mut dyn FnMut(&mut C)) -> bool {
        self.with_mut(index, |c| f(c)).is_some()
    }
}
