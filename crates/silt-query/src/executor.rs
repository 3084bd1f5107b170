//! The arena registry and predicate-composed query executor.
//!
//! [`QueryExecutor`] holds the set of arenas participating in queries
//! and evaluates lazily composed filters over all of them. Filters run
//! per candidate in declaration order — there is no batch precomputation
//! — so predicates should be cheap; that is a design constraint of the
//! executor, not an accident.

use std::any::TypeId;
use std::sync::Arc;

use indexmap::IndexMap;
use log::debug;

use silt_arena::AnyHandle;
use silt_core::traits::{Component, ComponentSource, QueryArena, SlotAccess};
use silt_core::ArenaId;

use crate::error::RegistryError;

/// Registry of queryable arenas.
///
/// Registration order is iteration order (the map is insertion-ordered),
/// so query results are deterministic for a fixed registration sequence.
pub struct QueryExecutor {
    arenas: IndexMap<ArenaId, Arc<dyn QueryArena>>,
}

impl QueryExecutor {
    /// Create an empty executor.
    pub fn new() -> Self {
        Self {
            arenas: IndexMap::new(),
        }
    }

    /// Register an arena for querying.
    ///
    /// Setup-time only; registering the same arena twice is an error.
    pub fn register(&mut self, arena: Arc<dyn QueryArena>) -> Result<(), RegistryError> {
        let id = arena.arena_id();
        if self.arenas.contains_key(&id) {
            return Err(RegistryError::DuplicateArena { id });
        }
        self.arenas.insert(id, arena);
        debug!("executor: arena {id} registered ({} total)", self.arenas.len());
        Ok(())
    }

    /// Remove an arena from the registry.
    ///
    /// Returns `false` if it was not registered — idempotent.
    pub fn unregister(&mut self, id: ArenaId) -> bool {
        let removed = self.arenas.shift_remove(&id).is_some();
        if removed {
            debug!("executor: arena {id} unregistered");
        }
        removed
    }

    /// Drop every registered arena.
    pub fn clear(&mut self) {
        self.arenas.clear();
    }

    /// Number of registered arenas.
    pub fn len(&self) -> usize {
        self.arenas.len()
    }

    /// Whether no arenas are registered.
    pub fn is_empty(&self) -> bool {
        self.arenas.is_empty()
    }

    /// The registered arena with the given identity, if any.
    pub fn arena(&self, id: ArenaId) -> Option<&Arc<dyn QueryArena>> {
        self.arenas.get(&id)
    }

    /// Start composing a query over every registered arena.
    pub fn query(&self) -> Query<'_> {
        Query {
            arenas: &self.arenas,
            filters: Vec::new(),
        }
    }
}

impl Default for QueryExecutor {
    fn default() -> Self {
        Self::new()
    }
}

enum Filter<'a> {
    Alive,
    OfType(TypeId),
    HasComponent(TypeId),
    Predicate(Box<dyn Fn(&AnyHandle, &dyn QueryArena, u32) -> bool + 'a>),
}

impl Filter<'_> {
    fn accept(&self, handle: &AnyHandle, arena: &dyn QueryArena, index: u32) -> bool {
        match self {
            Self::Alive => arena.is_valid_raw(index, handle.generation()),
            Self::OfType(entity_type) => arena.entity_type() == *entity_type,
            Self::HasComponent(component) => arena.has_component(*component),
            Self::Predicate(predicate) => predicate(handle, arena, index),
        }
    }
}

/// A lazily composed query over the executor's registered arenas.
///
/// Filters accumulate in declaration order and are evaluated in that
/// order against each candidate. Nothing runs until a terminal method
/// ([`Query::execute`], [`Query::for_each`], [`Query::first`],
/// [`Query::any`], [`Query::count`]) is called.
pub struct Query<'a> {
    arenas: &'a IndexMap<ArenaId, Arc<dyn QueryArena>>,
    filters: Vec<Filter<'a>>,
}

impl<'a> Query<'a> {
    /// Keep only handles whose slot the arena still considers valid.
    ///
    /// Re-checked at evaluation time, not at composition time.
    pub fn where_alive(mut self) -> Self {
        self.filters.push(Filter::Alive);
        self
    }

    /// Keep only handles from arenas storing entity type `E`.
    pub fn of_type<E: 'static>(mut self) -> Self {
        self.filters.push(Filter::OfType(TypeId::of::<E>()));
        self
    }

    /// Keep only handles whose arena has a registered store for `C`.
    ///
    /// This cuts across entity types: every arena that carries the
    /// component participates, whatever it stores.
    pub fn with_component<C: Component>(mut self) -> Self {
        self.filters.push(Filter::HasComponent(TypeId::of::<C>()));
        self
    }

    /// Keep only handles the predicate accepts.
    ///
    /// The predicate sees the candidate handle, its arena, and the slot
    /// index. It runs per candidate with the arena's read lock held, so
    /// it must be cheap and must not allocate or deallocate entities;
    /// use [`Query::execute`] first when the per-handle work mutates
    /// arenas.
    pub fn filter(
        mut self,
        predicate: impl Fn(&AnyHandle, &dyn QueryArena, u32) -> bool + 'a,
    ) -> Self {
        self.filters.push(Filter::Predicate(Box::new(predicate)));
        self
    }

    /// Materialize every match.
    pub fn execute(&self) -> QueryResult {
        let mut handles = Vec::new();
        self.visit(&mut |handle| {
            handles.push(handle);
            true
        });
        QueryResult { handles }
    }

    /// Stream every match through `f` without materializing a result.
    ///
    /// A single lazy pass; calling it again restarts from the beginning.
    /// The same lock caveat as [`Query::filter`] applies to `f`.
    pub fn for_each(&self, mut f: impl FnMut(AnyHandle)) {
        self.visit(&mut |handle| {
            f(handle);
            true
        });
    }

    /// The first match, if any; stops scanning as soon as one is found.
    pub fn first(&self) -> Option<AnyHandle> {
        let mut first = None;
        self.visit(&mut |handle| {
            first = Some(handle);
            false
        });
        first
    }

    /// Whether any candidate matches; short-circuits.
    pub fn any(&self) -> bool {
        self.first().is_some()
    }

    /// Number of matches, streamed without building a result.
    pub fn count(&self) -> usize {
        let mut count = 0;
        self.visit(&mut |_| {
            count += 1;
            true
        });
        count
    }

    /// Walk candidates arena by arena, applying filters in declaration
    /// order; the visitor returns `false` to stop the whole walk.
    fn visit(&self, visitor: &mut dyn FnMut(AnyHandle) -> bool) {
        for arena in self.arenas.values() {
            let mut stop = false;
            arena.for_each_slot(&mut |index, generation| {
                let erased: Arc<dyn SlotAccess> = arena.clone();
                let handle = AnyHandle::from_raw_parts(erased, index, generation);
                for filter in &self.filters {
                    if !filter.accept(&handle, arena.as_ref(), index) {
                        return true;
                    }
                }
                if visitor(handle) {
                    true
                } else {
                    stop = true;
                    false
                }
            });
            if stop {
                break;
            }
        }
    }
}

/// A materialized query result.
pub struct QueryResult {
    handles: Vec<AnyHandle>,
}

impl QueryResult {
    /// The matched handles, in arena-registration then slot order.
    pub fn handles(&self) -> &[AnyHandle] {
        &self.handles
    }

    /// Number of matches.
    pub fn count(&self) -> usize {
        self.handles.len()
    }

    /// Whether nothing matched.
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Consume the result, yielding its handles.
    pub fn into_handles(self) -> Vec<AnyHandle> {
        self.handles
    }
}

impl IntoIterator for QueryResult {
    type Item = AnyHandle;
    type IntoIter = std::vec::IntoIter<AnyHandle>;

    fn into_iter(self) -> Self::IntoIter {
        self.handles.into_iter()
    }
}

impl<'a> IntoIterator for &'a QueryResult {
    type Item = &'a AnyHandle;
    type IntoIter = std::slice::Iter<'a, AnyHandle>;

    fn into_iter(self) -> Self::IntoIter {
        self.handles.iter()
    }
}
