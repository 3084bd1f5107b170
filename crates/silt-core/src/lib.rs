//! Core identifiers and access traits for the Silt entity engine.
//!
//! This crate defines the vocabulary shared by the storage crate
//! (`silt-arena`) and the aggregation crate (`silt-query`): arena
//! identity, the erased slot/component access traits, and the component
//! marker. It deliberately contains no storage of its own — concrete
//! arenas live downstream and implement these traits.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod id;
pub mod traits;

pub use id::ArenaId;
pub use traits::{Component, ComponentAccess, ComponentSource, QueryArena, SlotAccess, TypeSet};
