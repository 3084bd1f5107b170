//! Silt quickstart — two entity kinds sharing one group and one query.
//!
//! Demonstrates:
//!   1. Building arenas with spawn/despawn hooks
//!   2. Registering component stores (explicit, per arena)
//!   3. Aggregating both arenas in a GroupContainer
//!   4. Component-filtered group views and speculative dispatch
//!   5. The QueryExecutor over heterogeneous arenas
//!   6. Compaction after a despawn wave
//!
//! Run with:
//!   cargo run --example patrol

use silt::prelude::*;

// ─── Entity kinds ───────────────────────────────────────────────

#[derive(Default)]
struct Scout {
    hp: i32,
}

#[derive(Default)]
struct Tower {
    ammo: u32,
}

// ─── Components ─────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Position {
    x: f32,
    y: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct Velocity {
    dx: f32,
    dy: f32,
}

fn main() {
    env_logger::init();

    // Scouts move; towers only sit somewhere.
    let scouts = GenerationalArena::<Scout>::builder()
        .on_spawn(|generation, scout: &mut Scout| {
            scout.hp = 20;
            log::info!("scout spawned at generation {generation}");
        })
        .on_despawn(|generation, _| log::info!("scout despawned at generation {generation}"))
        .build();
    let scout_positions = scouts.register_component::<Position>();
    scouts.register_component::<Velocity>();

    let towers = GenerationalArena::<Tower>::builder()
        .on_spawn(|_, tower: &mut Tower| tower.ammo = 50)
        .build();
    let tower_positions = towers.register_component::<Position>();

    // Spawn a patrol and a defensive line.
    let patrol: Vec<_> = (0..3).map(|_| scouts.allocate()).collect();
    for (i, scout) in patrol.iter().enumerate() {
        scout_positions.with_mut(scout.index(), |p| p.x = i as f32 * 10.0);
        scout.to_void().try_execute(|v: &mut Velocity| v.dx = 1.5);
    }
    let towers_up: Vec<_> = (0..2).map(|_| towers.allocate()).collect();
    for (i, tower) in towers_up.iter().enumerate() {
        tower_positions.with_mut(tower.index(), |p| p.y = i as f32 * 5.0);
    }

    // One group spanning both entity kinds.
    let mut targets = GroupContainer::new();
    targets.add_arena(scouts.clone()).unwrap();
    targets.add_arena(towers.clone()).unwrap();
    for scout in &patrol {
        targets.add(&scout.to_any());
    }
    for tower in &towers_up {
        targets.add(&tower.to_any());
    }
    println!("group tracks {} entries", targets.count());

    // Every positioned entity, regardless of kind.
    let positioned = targets.query::<(Position,)>();
    for handle in positioned.iter() {
        handle.try_execute(|p: &mut Position| println!("  target at ({}, {})", p.x, p.y));
    }

    // Only movers: towers lack a Velocity store, so the view skips them.
    let movers = targets.query::<(Position, Velocity)>().iter().count();
    println!("{movers} of them can move");

    // The executor sees both arenas too.
    let mut executor = QueryExecutor::new();
    executor.register(scouts.clone()).unwrap();
    executor.register(towers.clone()).unwrap();
    println!("executor matches {} entities", executor.query().count());
    println!(
        "  of which {} are scouts",
        executor.query().of_type::<Scout>().count()
    );

    // A despawn wave leaves stale group entries behind...
    for scout in &patrol {
        scouts.deallocate(scout);
    }
    println!(
        "after the wave: {} tracked, {} active",
        targets.count(),
        targets.active_count()
    );

    // ...until compaction sweeps them out.
    targets.compact();
    println!("after compact: {} tracked", targets.count());
}
