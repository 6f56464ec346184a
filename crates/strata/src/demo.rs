//! # Demonstration Scenario
//!
//! A small headless simulation touching every runtime primitive:
//!
//! | System                | Phase     | Pausible | Role                               |
//! |-----------------------|-----------|----------|------------------------------------|
//! | `ScriptedPauseSystem` | Input     | no       | Presses "pause" on scripted ticks  |
//! | `ReaperSystem`        | PreUpdate | yes      | Destroys expired entities          |
//! | `MovementSystem`      | Update    | yes      | Integrates velocity into position  |
//! | `LifetimeSystem`      | Update    | yes      | Ages entities, publishes expiry    |
//! | `RenderProbeSystem`   | Render    | no       | Samples positions for presentation |
//!
//! `LifetimeSystem` never destroys anything itself: it publishes
//! [`LifetimeExpired`] and the reaper, which owns destruction, queues it and
//! applies the queue at the start of its next update.

use std::cell::RefCell;
use std::rc::Rc;

use strata_core::{CommandQueue, Component, EcsResult, Entity, Event, Phase, System, World};
use tracing::{debug, info};

use crate::config::AppConfig;

// =============================================================================
// Components
// =============================================================================

/// World-space position.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Position {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}
impl Component for Position {}

/// Units per second.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Velocity {
    /// X speed.
    pub x: f32,
    /// Y speed.
    pub y: f32,
}
impl Component for Velocity {}

/// Seconds left before the entity expires.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lifetime {
    /// Remaining seconds.
    pub remaining: f32,
}
impl Component for Lifetime {}

// =============================================================================
// Events
// =============================================================================

/// An entity's lifetime ran out.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LifetimeExpired {
    /// The expired entity.
    pub entity: Entity,
}
impl Event for LifetimeExpired {}

/// The pause key was pressed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PauseToggled {
    /// Pause state from the next tick on.
    pub paused: bool,
    /// Tick on which the key was pressed.
    pub tick: u64,
}
impl Event for PauseToggled {}

// =============================================================================
// Systems
// =============================================================================

/// Toggles pause on scripted ticks. Keeps running while paused so it can
/// resume the world.
#[derive(Debug)]
pub struct ScriptedPauseSystem {
    toggles: Vec<u64>,
}

impl ScriptedPauseSystem {
    /// Creates the system from the ticks on which pause is toggled.
    #[must_use]
    pub fn new(mut toggles: Vec<u64>) -> Self {
        toggles.sort_unstable();
        toggles.dedup();
        Self { toggles }
    }
}

impl System for ScriptedPauseSystem {
    fn name(&self) -> &str {
        "scripted_pause"
    }

    fn pausible(&self) -> bool {
        false
    }

    fn update(&mut self, world: &mut World, _delta_time: f32) {
        let tick = world.current_tick();
        if self.toggles.binary_search(&tick).is_err() {
            return;
        }

        let paused = !world.is_paused();
        world.set_paused(paused);
        info!(tick, paused, "pause toggled");
        world.publish(PauseToggled { paused, tick });
    }
}

/// Owns entity destruction for expired lifetimes.
#[derive(Debug, Default)]
pub struct ReaperSystem {
    pending: CommandQueue,
    reaped: Rc<RefCell<u64>>,
}

impl ReaperSystem {
    /// Creates the reaper and a handle to its running total.
    #[must_use]
    pub fn new() -> (Self, Rc<RefCell<u64>>) {
        let system = Self::default();
        let reaped = Rc::clone(&system.reaped);
        (system, reaped)
    }
}

impl System for ReaperSystem {
    fn name(&self) -> &str {
        "reaper"
    }

    fn initialize(&mut self, world: &mut World) {
        let pending = self.pending.clone();
        world.subscribe(move |_: &mut World, event: &LifetimeExpired| {
            pending.destroy(event.entity);
        });
    }

    fn update(&mut self, world: &mut World, _delta_time: f32) {
        let applied = self.pending.apply(world);
        if applied > 0 {
            *self.reaped.borrow_mut() += applied as u64;
            debug!(applied, alive = world.entity_count(), "reaped expired entities");
        }
    }
}

/// Integrates velocity into position.
#[derive(Debug, Default)]
pub struct MovementSystem;

impl System for MovementSystem {
    fn name(&self) -> &str {
        "movement"
    }

    fn update(&mut self, world: &mut World, delta_time: f32) {
        let (positions, velocities) = world.pool_pair_mut::<Position, Velocity>();
        for (entity, position) in positions.iter_mut() {
            if let Some(velocity) = velocities.get(entity) {
                position.x += velocity.x * delta_time;
                position.y += velocity.y * delta_time;
            }
        }
    }
}

/// Ages entities and announces expiry.
#[derive(Debug, Default)]
pub struct LifetimeSystem;

impl System for LifetimeSystem {
    fn name(&self) -> &str {
        "lifetime"
    }

    fn update(&mut self, world: &mut World, delta_time: f32) {
        // Snapshot first: handlers may run while we walk
        for entity in world.entities_with::<Lifetime>() {
            let Some(lifetime) = world.get_mut::<Lifetime>(entity) else {
                continue;
            };
            let was_live = lifetime.remaining > 0.0;
            lifetime.remaining -= delta_time;
            if was_live && lifetime.remaining <= 0.0 {
                world.publish(LifetimeExpired { entity });
            }
        }
    }
}

/// One presentation sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ProbeSample {
    /// Tick the sample was taken on.
    pub tick: u64,
    /// Entities with a position.
    pub visible: usize,
    /// Mean position of the visible entities.
    pub centroid: (f32, f32),
    /// Whether the world was paused.
    pub paused: bool,
}

/// Shared log of probe samples.
pub type ProbeLog = Rc<RefCell<Vec<ProbeSample>>>;

/// Samples positions once per tick, paused or not.
#[derive(Debug, Default)]
pub struct RenderProbeSystem {
    samples: ProbeLog,
}

impl RenderProbeSystem {
    /// Creates the probe and a handle to its samples.
    #[must_use]
    pub fn new() -> (Self, ProbeLog) {
        let system = Self::default();
        let samples = Rc::clone(&system.samples);
        (system, samples)
    }
}

impl System for RenderProbeSystem {
    fn name(&self) -> &str {
        "render_probe"
    }

    fn pausible(&self) -> bool {
        false
    }

    fn update(&mut self, world: &mut World, _delta_time: f32) {
        let (visible, sum_x, sum_y) = world.pool::<Position>().map_or((0, 0.0, 0.0), |pool| {
            pool.iter()
                .fold((0, 0.0, 0.0), |(n, x, y), (_, p)| (n + 1, x + p.x, y + p.y))
        });
        let centroid = if visible == 0 {
            (0.0, 0.0)
        } else {
            (sum_x / visible as f32, sum_y / visible as f32)
        };

        self.samples.borrow_mut().push(ProbeSample {
            tick: world.current_tick(),
            visible,
            centroid,
            paused: world.is_paused(),
        });
    }
}

// =============================================================================
// Scenario
// =============================================================================

/// Handles to observe a running scenario.
#[derive(Debug, Clone)]
pub struct Scenario {
    /// Presentation samples, one per tick.
    pub probe: ProbeLog,
    /// Entities destroyed by the reaper so far.
    pub reaped: Rc<RefCell<u64>>,
}

/// Spawns the demo entities and registers the demo systems.
///
/// Entity `i` moves along a ring direction and lives for
/// `0.5 * (1 + i % 4)` seconds; every fourth entity has no lifetime.
///
/// # Errors
///
/// Propagates component insertion failures.
pub fn install(world: &mut World, config: &AppConfig) -> EcsResult<Scenario> {
    for i in 0..config.entities {
        let entity = world.create_entity();
        let angle = i as f32 * 0.618_034 * std::f32::consts::TAU;
        world.insert(entity, Position::default())?;
        world.insert(
            entity,
            Velocity {
                x: angle.cos(),
                y: angle.sin(),
            },
        )?;
        if i % 4 != 3 {
            world.insert(
                entity,
                Lifetime {
                    remaining: 0.5 * (1 + i % 4) as f32,
                },
            )?;
        }
    }

    let (reaper, reaped) = ReaperSystem::new();
    let (probe_system, probe) = RenderProbeSystem::new();

    world.add_system(
        ScriptedPauseSystem::new(config.pause_toggles.clone()),
        Phase::Input,
        0,
    );
    world.add_system(reaper, Phase::PreUpdate, 0);
    world.add_system(MovementSystem, Phase::Update, 0);
    world.add_system(LifetimeSystem, Phase::Update, 10);
    world.add_system(probe_system, Phase::Render, 0);

    info!(
        entities = config.entities,
        systems = world.system_count(),
        "demo scenario installed"
    );
    Ok(Scenario { probe, reaped })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(entities: usize, pause_toggles: Vec<u64>) -> AppConfig {
        AppConfig {
            entities,
            pause_toggles,
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_schedule_order() {
        let mut world = World::new();
        install(&mut world, &config(0, vec![])).unwrap();

        let names: Vec<_> = world.schedule().into_iter().map(|info| info.name).collect();
        assert_eq!(
            names,
            vec!["scripted_pause", "reaper", "movement", "lifetime", "render_probe"]
        );
    }

    #[test]
    fn test_movement_integrates_velocity() {
        let mut world = World::new();
        let e = world.create_entity();
        world.insert(e, Position::default()).unwrap();
        world.insert(e, Velocity { x: 2.0, y: -1.0 }).unwrap();
        world.add_system(MovementSystem, Phase::Update, 0);

        world.tick(0.5);
        assert_eq!(world.get::<Position>(e), Some(&Position { x: 1.0, y: -0.5 }));
    }

    #[test]
    fn test_expired_entities_are_reaped_next_tick() {
        let mut world = World::new();
        let (reaper, reaped) = ReaperSystem::new();
        world.add_system(reaper, Phase::PreUpdate, 0);
        world.add_system(LifetimeSystem, Phase::Update, 0);

        let short = world.create_entity();
        let long = world.create_entity();
        world.insert(short, Lifetime { remaining: 0.5 }).unwrap();
        world.insert(long, Lifetime { remaining: 5.0 }).unwrap();

        world.tick(1.0);
        assert!(world.is_alive(short));

        world.tick(1.0);
        assert!(!world.is_alive(short));
        assert!(world.is_alive(long));
        assert_eq!(*reaped.borrow(), 1);
    }

    #[test]
    fn test_scripted_pause_freezes_simulation() {
        let mut world = World::new();
        let scenario = install(&mut world, &config(4, vec![2, 4])).unwrap();
        let toggles = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&toggles);
        world.subscribe(move |_: &mut World, event: &PauseToggled| {
            sink.borrow_mut().push((event.tick, event.paused));
        });

        for _ in 0..5 {
            world.tick(0.1);
        }

        assert_eq!(*toggles.borrow(), vec![(2, true), (4, false)]);

        let samples = scenario.probe.borrow();
        assert_eq!(samples.len(), 5);
        assert!(samples[1].paused);
        assert!(samples[2].paused);
        assert!(!samples[3].paused);

        // Pressed on tick 2 and tick 4: ticks 3 and 4 are frozen
        assert_ne!(samples[0].centroid, samples[1].centroid);
        assert_eq!(samples[1].centroid, samples[2].centroid);
        assert_eq!(samples[2].centroid, samples[3].centroid);
        assert_ne!(samples[3].centroid, samples[4].centroid);
    }

    #[test]
    fn test_full_run_reaps_every_mortal_entity() {
        let mut world = World::new();
        let scenario = install(&mut world, &config(8, vec![])).unwrap();

        // Longest lifetime is 1.5s
        for _ in 0..20 {
            world.tick(0.1);
        }

        // Entities 3 and 7 have no lifetime
        assert_eq!(*scenario.reaped.borrow(), 6);
        assert_eq!(world.entity_count(), 2);
        assert_eq!(world.entities_with::<Lifetime>().len(), 0);
        assert_eq!(scenario.probe.borrow().last().map(|s| s.visible), Some(2));
    }
}
