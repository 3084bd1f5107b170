//! Strongly-typed identifiers shared across the Silt crates.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for unique [`ArenaId`] allocation.
static ARENA_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique per-instance identifier for an arena.
///
/// Allocated from a monotonic atomic counter via [`ArenaId::next`]. Two
/// distinct arena instances always have different IDs, even if they store
/// the same entity type. Handles embed the owning arena's ID so that
/// equality between handles from different arenas is never accidental,
/// and so containers can route a handle back to its owning segment.
///
/// Dropping an arena never recycles its ID, which rules out ABA confusion
/// when an arena is torn down and a new one is created at the same address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArenaId(u64);

impl ArenaId {
    /// Allocate a fresh, unique arena ID.
    ///
    /// Each call returns a new ID that has never been returned before
    /// within this process. Thread-safe.
    pub fn next() -> Self {
        Self(ARENA_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for ArenaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
