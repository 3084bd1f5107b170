//! Integration test: cross-type queries over heterogeneous arenas.
//!
//! Two entity kinds (walkers and turrets) both expose a `Position`
//! component; only walkers have `Velocity`. A query executor spanning
//! both arenas must return handles from each, and speculative component
//! dispatch must succeed exactly where the component exists.

use std::sync::Arc;

use silt_arena::Spawner;
use silt_query::{GroupContainer, QueryExecutor};
use silt_test_utils::{turret_arena, walker_arena, Position, Turret, Velocity, Walker};

#[test]
fn executor_returns_handles_from_both_arenas() {
    let (walkers, _wp, _wv) = walker_arena();
    let (turrets, _tp) = turret_arena();
    walkers.allocate();
    walkers.allocate();
    turrets.allocate();

    let mut executor = QueryExecutor::new();
    executor.register(walkers.clone()).unwrap();
    executor.register(turrets.clone()).unwrap();

    let result = executor.query().where_alive().execute();
    assert_eq!(result.count(), 3);
    let from_walkers = result
        .handles()
        .iter()
        .filter(|h| h.arena_id() == walkers.id())
        .count();
    let from_turrets = result
        .handles()
        .iter()
        .filter(|h| h.arena_id() == turrets.id())
        .count();
    assert_eq!(from_walkers, 2);
    assert_eq!(from_turrets, 1);
}

#[test]
fn component_restricted_query_spans_entity_kinds() {
    let (walkers, _wp, _wv) = walker_arena();
    let (turrets, _tp) = turret_arena();
    walkers.allocate();
    turrets.allocate();

    let mut executor = QueryExecutor::new();
    executor.register(walkers.clone()).unwrap();
    executor.register(turrets.clone()).unwrap();

    // Both kinds carry Position, so the restriction keeps both arenas.
    let positioned = executor
        .query()
        .where_alive()
        .with_component::<Position>()
        .execute();
    assert_eq!(positioned.count(), 2);
    let ids: Vec<_> = positioned.handles().iter().map(|h| h.arena_id()).collect();
    assert!(ids.contains(&walkers.id()));
    assert!(ids.contains(&turrets.id()));

    // Velocity exists only on walkers.
    let movers = executor
        .query()
        .where_alive()
        .with_component::<Velocity>()
        .execute();
    assert_eq!(movers.count(), 1);
    assert_eq!(movers.handles()[0].arena_id(), walkers.id());
}

#[test]
fn of_type_separates_entity_kinds() {
    let (walkers, _wp, _wv) = walker_arena();
    let (turrets, _tp) = turret_arena();
    walkers.allocate();
    turrets.allocate();
    turrets.allocate();

    let mut executor = QueryExecutor::new();
    executor.register(walkers.clone()).unwrap();
    executor.register(turrets.clone()).unwrap();

    assert_eq!(executor.query().of_type::<Walker>().count(), 1);
    assert_eq!(executor.query().of_type::<Turret>().count(), 2);
}

#[test]
fn position_dispatch_spans_kinds_velocity_does_not() {
    let (walkers, _wp, _wv) = walker_arena();
    let (turrets, _tp) = turret_arena();
    let walker = walkers.allocate().to_void();
    let turret = turrets.allocate().to_void();

    // Both kinds carry Position.
    assert!(walker.try_execute(|p: &mut Position| p.x = 1.0));
    assert!(turret.try_execute(|p: &mut Position| p.x = 2.0));

    // Only walkers carry Velocity; the turret refusal is silent.
    assert!(walker.try_execute(|v: &mut Velocity| v.dx = 3.0));
    assert!(!turret.try_execute(|_: &mut Velocity| unreachable!("turrets have no velocity")));
}

#[test]
fn group_views_filter_by_component_set() {
    let (walkers, _wp, _wv) = walker_arena();
    let (turrets, _tp) = turret_arena();

    let mut group = GroupContainer::new();
    group.add_arena(walkers.clone()).unwrap();
    group.add_arena(turrets.clone()).unwrap();
    for _ in 0..2 {
        group.add(&walkers.allocate().to_any());
    }
    for _ in 0..3 {
        group.add(&turrets.allocate().to_any());
    }

    // Every entity is positioned; only walkers move.
    assert_eq!(group.query::<(Position,)>().iter().count(), 5);
    assert_eq!(group.query::<(Position, Velocity)>().iter().count(), 2);

    // The positioned view reaches components on both kinds.
    let mut reached = 0;
    for handle in group.query::<(Position,)>().iter() {
        assert!(handle.try_execute(|p: &mut Position| p.y += 1.0));
        reached += 1;
    }
    assert_eq!(reached, 5);
}

#[test]
fn spawner_bridges_both_kinds() {
    let (walkers, _wp, _wv) = walker_arena();
    let (turrets, _tp) = turret_arena();
    let spawners: Vec<Arc<dyn Spawner>> = vec![walkers.clone(), turrets.clone()];

    for spawner in &spawners {
        let handle = spawner.spawn();
        assert!(handle.is_valid());
        assert!(spawner.despawn(&handle.to_any()));
        assert!(!handle.is_valid());
        assert!(!spawner.despawn(&handle.to_any()));
    }
    assert!(walkers.is_empty());
    assert!(turrets.is_empty());
}
