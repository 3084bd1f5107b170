//! Generational slot arenas, handles, and component storage.
//!
//! Provides pooled entity storage with generation tracking for stable,
//! checkable references inside a single-writer-per-tick game loop. This
//! is the one Silt crate that may contain `unsafe` code, confined to the
//! lock-bypassing unchecked accessors.
//!
//! # Architecture
//!
//! ```text
//! GenerationalArena<T> (slot allocator)
//! ├── SlotStore → Slot[] (dense values + generations + active flags, free list)
//! ├── registration table (TypeId → erased ComponentArena<C>)
//! └── lifecycle hooks (on_spawn / on_despawn, constructor-time only)
//!
//! Handle<T>   — typed reference (arena + index + generation)
//! AnyHandle   — erased via Arc<dyn SlotAccess>
//! VoidHandle  — erased via Arc<dyn ComponentSource>, speculative
//!               component dispatch through try_execute::<C>
//!
//! ComponentArena<C> — parallel Vec<C>, index-aligned with its owner,
//!                     validity delegated to the owner's slots
//! ```
//!
//! # Concurrency
//!
//! Each arena exposes a single mutual-exclusion boundary (an internal
//! `RwLock`) guarding allocation, deallocation, and every checked
//! accessor. Spawn-hook effects are visible to any thread that obtains
//! the returned handle — the lock provides the happens-before edge. The
//! unchecked accessors bypass that lock deliberately for hot per-tick
//! reads; their safety contracts require the caller to uphold
//! single-writer discipline for the tick. Misusing them is the one place
//! memory-safety bugs can reappear in this crate.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod arena;
pub mod component;
pub mod config;
pub mod handle;
pub mod spawn;

pub use arena::GenerationalArena;
pub use component::ComponentArena;
pub use config::{ArenaBuilder, LifecycleHook};
pub use handle::{AnyHandle, Handle, VoidHandle};
pub use spawn::Spawner;
