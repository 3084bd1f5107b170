//! Multi-arena aggregation and querying for the Silt entity engine.
//!
//! Builds on `silt-arena`'s erased access traits to treat heterogeneous
//! arenas uniformly:
//!
//! ```text
//! GroupContainer
//! ├── ArenaSegment × N (one per participating arena)
//! │   └── Vec<SlotKey> — sorted by (index, generation) for
//! │       binary-search insert / remove / lookup
//! ├── iter() / iter_from()       — allocation-free traversal
//! └── query::<(C1, …)>()         — lazy component-filtered views
//!
//! QueryExecutor
//! ├── registry: ArenaId → Arc<dyn QueryArena> (insertion-ordered)
//! └── query() — composable filters (where_alive / of_type / filter),
//!     evaluated per candidate in declaration order
//! ```
//!
//! Neither type ever mutates arena contents; they read through the
//! arenas' own checked accessors, so mutation rights stay with whoever
//! owns each arena.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod executor;
pub mod group;
pub mod segment;

pub use error::{GroupError, RegistryError};
pub use executor::{Query, QueryExecutor, QueryResult};
pub use group::{ComponentSet, GroupContainer, GroupIter, GroupQuery, GroupQueryIter};
pub use segment::{ArenaSegment, SlotKey};
