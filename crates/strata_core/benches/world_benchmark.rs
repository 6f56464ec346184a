//! # World Benchmark
//!
//! Measures the hot paths of a frame:
//! - entity churn (create, attach, destroy with cascade)
//! - pool iteration with disjoint pool access
//! - event fan-out through the bus
//! - a full scheduled tick
//!
//! Run with: `cargo bench --package strata_core`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use strata_core::{CommandQueue, Component, Event, FnSystem, Phase, World};

#[derive(Clone, Copy, Default)]
struct Position {
    x: f32,
    y: f32,
}
impl Component for Position {}

#[derive(Clone, Copy, Default)]
struct Velocity {
    x: f32,
    y: f32,
}
impl Component for Velocity {}

struct Health(u32);
impl Component for Health {}

struct Damaged(u32);
impl Event for Damaged {}

fn populated_world(count: usize) -> World {
    let mut world = World::new();
    for i in 0..count {
        let e = world.create_entity();
        let f = i as f32;
        world.insert(e, Position { x: f, y: f }).unwrap();
        world.insert(e, Velocity { x: 0.1, y: 0.2 }).unwrap();
    }
    world
}

/// Create, populate, then destroy entities (destroy cascades to both pools).
fn bench_entity_churn(c: &mut Criterion) {
    let mut group = c.benchmark_group("entity_churn");

    for count in [1_000, 10_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut world = populated_world(count);
                for e in world.entities() {
                    world.destroy_entity(e);
                }
                black_box(world.entity_count())
            });
        });
    }

    group.finish();
}

/// Integrate positions over the velocity pool.
fn bench_movement(c: &mut Criterion) {
    let mut world = populated_world(100_000);

    c.bench_function("movement_100k", |b| {
        b.iter(|| {
            let (positions, velocities) = world.pool_pair_mut::<Position, Velocity>();
            for (entity, pos) in positions.iter_mut() {
                if let Some(vel) = velocities.get(entity) {
                    pos.x += vel.x * 0.016;
                    pos.y += vel.y * 0.016;
                }
            }
            black_box(positions.len())
        });
    });
}

/// One publish reaching many handlers.
fn bench_publish_fanout(c: &mut Criterion) {
    let mut group = c.benchmark_group("publish_fanout");

    for handlers in [1, 16, 128] {
        let mut world = World::new();
        let target = world.create_entity();
        world.insert(target, Health(u32::MAX)).unwrap();
        for _ in 0..handlers {
            world.subscribe(move |world: &mut World, event: &Damaged| {
                if let Some(health) = world.get_mut::<Health>(target) {
                    health.0 = health.0.saturating_sub(event.0);
                }
            });
        }

        group.bench_with_input(BenchmarkId::from_parameter(handlers), &handlers, |b, _| {
            b.iter(|| black_box(world.publish(Damaged(1))));
        });
    }

    group.finish();
}

/// A full tick: movement plus a handler-driven deferred destroy.
fn bench_tick(c: &mut Criterion) {
    let mut world = populated_world(10_000);

    world.add_system(
        FnSystem::new("movement", |world: &mut World, dt: f32| {
            let (positions, velocities) = world.pool_pair_mut::<Position, Velocity>();
            for (entity, pos) in positions.iter_mut() {
                if let Some(vel) = velocities.get(entity) {
                    pos.x += vel.x * dt;
                    pos.y += vel.y * dt;
                }
            }
        }),
        Phase::Update,
        0,
    );

    let target = world.create_entity();
    let pending = CommandQueue::new();
    let queue = pending.clone();
    world.subscribe(move |_: &mut World, event: &Damaged| {
        if event.0 > 0 {
            queue.remove::<Health>(target);
        }
    });
    world.add_system(
        FnSystem::new("reaper", move |world: &mut World, _dt: f32| {
            world.publish(Damaged(1));
            pending.apply(world);
        }),
        Phase::PreUpdate,
        0,
    );

    c.bench_function("tick_10k", |b| {
        b.iter(|| black_box(world.tick(0.016)));
    });
}

criterion_group!(
    benches,
    bench_entity_churn,
    bench_movement,
    bench_publish_fanout,
    bench_tick,
);
criterion_main!(benches);
