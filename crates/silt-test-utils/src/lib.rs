//! Test fixtures and sample entity types for Silt development.
//!
//! Provides two small entity kinds with overlapping component sets —
//! enough to exercise cross-type iteration and speculative component
//! dispatch without each test inventing its own menagerie.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

use std::sync::Arc;

use silt_arena::{ComponentArena, GenerationalArena};

/// A mobile test entity. Carries [`Position`] and [`Velocity`].
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Walker {
    /// Hit points; spawn hooks in tests usually reset this.
    pub hp: i32,
}

/// A stationary test entity. Carries [`Position`] only.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Turret {
    /// Rounds remaining.
    pub ammo: u32,
}

/// 2D position component shared by both entity kinds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

/// 2D velocity component carried by walkers only.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Velocity {
    /// X velocity.
    pub dx: f32,
    /// Y velocity.
    pub dy: f32,
}

/// A walker arena with [`Position`] and [`Velocity`] stores registered.
pub fn walker_arena() -> (
    Arc<GenerationalArena<Walker>>,
    Arc<ComponentArena<Position>>,
    Arc<ComponentArena<Velocity>>,
) {
    let arena = GenerationalArena::<Walker>::builder().build();
    let positions = arena.register_component::<Position>();
    let velocities = arena.register_component::<Velocity>();
    (arena, positions, velocities)
}

/// A turret arena with only a [`Position`] store registered.
pub fn turret_arena() -> (
    Arc<GenerationalArena<Turret>>,
    Arc<ComponentArena<Position>>,
) {
    let arena = GenerationalArena::<Turret>::builder().build();
    let positions = arena.register_component::<Position>();
    (arena, positions)
}
