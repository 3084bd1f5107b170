//! Setup-time error types.
//!
//! Steady-state misses (stale handles, untracked entries, absent
//! components) are boolean outcomes on the hot path, never errors; the
//! enums here cover only construction-time misuse detected once at
//! setup.

use std::error::Error;
use std::fmt;

use silt_core::ArenaId;

/// Errors from [`GroupContainer`](crate::group::GroupContainer) setup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroupError {
    /// The arena is already part of this group.
    DuplicateArena {
        /// The arena that was registered twice.
        id: ArenaId,
    },
}

impl fmt::Display for GroupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateArena { id } => {
                write!(f, "arena {id} is already part of this group")
            }
        }
    }
}

impl Error for GroupError {}

/// Errors from [`QueryExecutor`](crate::executor::QueryExecutor) setup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistryError {
    /// The arena is already registered with this executor.
    DuplicateArena {
        /// The arena that was registered twice.
        id: ArenaId,
    },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateArena { id } => {
                write!(f, "arena {id} is already registered")
            }
        }
    }
}

impl Error for RegistryError {}
