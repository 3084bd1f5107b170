//! Silt: an entity arena and query engine for tick-based game simulations.
//!
//! This is the top-level facade crate that re-exports the public API
//! from the Silt sub-crates. For most users, adding `silt` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use silt::prelude::*;
//!
//! #[derive(Default)]
//! struct Imp {
//!     hp: i32,
//! }
//! #[derive(Clone, Copy, Debug, Default, PartialEq)]
//! struct Position {
//!     x: f32,
//!     y: f32,
//! }
//!
//! // An arena whose spawn hook initializes every imp.
//! let imps = GenerationalArena::<Imp>::builder()
//!     .on_spawn(|_, imp: &mut Imp| imp.hp = 10)
//!     .build();
//! let positions = imps.register_component::<Position>();
//!
//! // Allocate, write a component, and query.
//! let imp = imps.allocate();
//! assert!(imp.is_valid());
//! assert_eq!(imps.with(&imp, |i| i.hp), Some(10));
//! positions.with_mut(imp.index(), |p| p.x = 4.0);
//!
//! let mut executor = QueryExecutor::new();
//! executor.register(imps.clone()).unwrap();
//! assert_eq!(executor.query().of_type::<Imp>().count(), 1);
//!
//! // Speculative component dispatch through an erased handle.
//! let erased = imp.to_void();
//! assert!(erased.try_execute(|p: &mut Position| p.y = 2.0));
//! assert_eq!(positions.try_get(imp.index()), Some(Position { x: 4.0, y: 2.0 }));
//!
//! // Deallocation invalidates every copy of the handle, forever.
//! assert!(imps.deallocate(&imp));
//! assert!(!imp.is_valid());
//! assert!(!erased.try_execute(|_: &mut Position| unreachable!()));
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in
//! the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `silt-core` | Arena IDs and the erased access traits |
//! | [`arena`] | `silt-arena` | `GenerationalArena`, handles, component stores |
//! | [`query`] | `silt-query` | `GroupContainer` and the `QueryExecutor` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Arena IDs and the erased access traits (`silt-core`).
pub use silt_core as types;

/// Slot arenas, handles, and component storage (`silt-arena`).
pub use silt_arena as arena;

/// Group containers and the query executor (`silt-query`).
pub use silt_query as query;

/// The most commonly used types, re-exported flat.
pub mod prelude {
    pub use silt_arena::{
        AnyHandle, ArenaBuilder, ComponentArena, GenerationalArena, Handle, Spawner, VoidHandle,
    };
    pub use silt_core::{ArenaId, Component, ComponentAccess, QueryArena, SlotAccess};
    pub use silt_query::{ComponentSet, GroupContainer, QueryExecutor};
}
