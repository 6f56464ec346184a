//! # Systems & Scheduling
//!
//! A system is a unit of per-tick behavior. The scheduler keeps systems in
//! execution order:
//!
//! ```text
//! Input ──> PreUpdate ──> Update ──> Render
//!   │           │            │          │
//!   └ ascending priority, ties in registration order
//! ```
//!
//! Every system is initialized exactly once, when it is registered, and then
//! updated once per tick for the lifetime of the world.

use std::fmt;

use super::world::World;

/// Coarse ordering bucket. Every system of a phase runs before any system of
/// a later phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// Raw input resolved into semantic actions.
    Input,
    /// Work that must observe this tick's input before simulation.
    PreUpdate,
    /// Simulation: AI, physics, gameplay state.
    Update,
    /// Sampling of simulated state for presentation.
    Render,
}

impl Phase {
    /// All phases in execution order.
    pub const ALL: [Self; 4] = [Self::Input, Self::PreUpdate, Self::Update, Self::Render];

    /// Lowercase phase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::PreUpdate => "pre_update",
            Self::Update => "update",
            Self::Render => "render",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A scheduled unit of per-tick behavior.
///
/// Systems may read and write any pool and publish or subscribe to any
/// event; nothing restricts what a system touches.
pub trait System {
    /// Name used in logs and in [`World::schedule`].
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Whether the system is skipped while the world is paused.
    fn pausible(&self) -> bool {
        true
    }

    /// Called exactly once, when the system is registered. The usual place
    /// to subscribe event handlers.
    fn initialize(&mut self, _world: &mut World) {}

    /// Called once per tick.
    fn update(&mut self, world: &mut World, delta_time: f32);
}

/// Adapter turning a closure into a [`System`].
///
/// # Example
///
/// ```rust
/// use strata_core::{FnSystem, Phase, World};
///
/// let mut world = World::new();
/// world.add_system(
///     FnSystem::new("unpause_watcher", |_world: &mut World, _dt: f32| {}).non_pausible(),
///     Phase::Input,
///     0,
/// );
/// ```
pub struct FnSystem<F> {
    name: &'static str,
    pausible: bool,
    run: F,
}

impl<F> FnSystem<F>
where
    F: FnMut(&mut World, f32),
{
    /// Wraps `run` as a pausible system.
    #[must_use]
    pub fn new(name: &'static str, run: F) -> Self {
        Self {
            name,
            pausible: true,
            run,
        }
    }

    /// Keeps the system running while the world is paused.
    #[must_use]
    pub fn non_pausible(mut self) -> Self {
        self.pausible = false;
        self
    }
}

impl<F> System for FnSystem<F>
where
    F: FnMut(&mut World, f32),
{
    fn name(&self) -> &str {
        self.name
    }

    fn pausible(&self) -> bool {
        self.pausible
    }

    fn update(&mut self, world: &mut World, delta_time: f32) {
        (self.run)(world, delta_time);
    }
}

/// Identifies a registered system.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SystemId(u32);

/// Descriptive row of the schedule.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SystemInfo {
    /// Registration handle.
    pub id: SystemId,
    /// System name.
    pub name: String,
    /// Phase the system runs in.
    pub phase: Phase,
    /// Priority within the phase (ascending).
    pub priority: i32,
    /// Whether the system is skipped while paused.
    pub pausible: bool,
}

/// Registration record: (system, phase, priority).
pub(crate) struct ScheduledSystem {
    pub(crate) id: SystemId,
    pub(crate) phase: Phase,
    pub(crate) priority: i32,
    /// Name captured at registration.
    pub(crate) name: String,
    /// Pause policy captured at registration.
    pub(crate) pausible: bool,
    /// `None` while the system is being initialized or updated.
    pub(crate) system: Option<Box<dyn System>>,
}

impl ScheduledSystem {
    /// Reserves a record for `system`; the system is attached separately.
    pub(crate) fn reserve(id: SystemId, phase: Phase, priority: i32, system: &dyn System) -> Self {
        Self {
            id,
            phase,
            priority,
            name: system.name().to_owned(),
            pausible: system.pausible(),
            system: None,
        }
    }

    fn key(&self) -> (Phase, i32) {
        (self.phase, self.priority)
    }

    fn info(&self) -> SystemInfo {
        SystemInfo {
            id: self.id,
            name: self.name.clone(),
            phase: self.phase,
            priority: self.priority,
            pausible: self.pausible,
        }
    }
}

/// Ordered collection of registered systems.
///
/// While a tick walks `systems` by index, new registrations wait in
/// `pending` so the walked list never shifts.
#[derive(Default)]
pub(crate) struct Scheduler {
    /// Systems in execution order.
    pub(crate) systems: Vec<ScheduledSystem>,
    /// Systems registered during the current tick.
    pending: Vec<ScheduledSystem>,
    /// Nesting of ticks in progress.
    running: u32,
    /// Next system id.
    next_id: u32,
}

impl Scheduler {
    /// Hands out the next system id.
    pub(crate) fn next_id(&mut self) -> SystemId {
        let id = SystemId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Inserts a system after every system with a lower or equal
    /// (phase, priority) key, which keeps ties in registration order.
    /// During a tick the system is parked until [`Scheduler::end_tick`].
    pub(crate) fn insert(&mut self, entry: ScheduledSystem) {
        if self.running > 0 {
            self.pending.push(entry);
        } else {
            insert_sorted(&mut self.systems, entry);
        }
    }

    /// Attaches the boxed system to its reserved record.
    pub(crate) fn attach(&mut self, id: SystemId, system: Box<dyn System>) {
        let entry = self
            .systems
            .iter_mut()
            .chain(self.pending.iter_mut())
            .find(|entry| entry.id == id);
        match entry {
            Some(entry) => entry.system = Some(system),
            None => unreachable!("system {id:?} was reserved before attaching"),
        }
    }

    /// Marks the start of a tick.
    pub(crate) fn begin_tick(&mut self) {
        self.running += 1;
    }

    /// Marks the end of a tick, merging systems registered during it.
    pub(crate) fn end_tick(&mut self) {
        self.running -= 1;
        if self.running == 0 {
            for entry in std::mem::take(&mut self.pending) {
                insert_sorted(&mut self.systems, entry);
            }
        }
    }

    /// Schedule rows in execution order, including systems registered
    /// during the current tick.
    pub(crate) fn infos(&self) -> Vec<SystemInfo> {
        let mut infos: Vec<SystemInfo> = self.systems.iter().map(ScheduledSystem::info).collect();
        for entry in &self.pending {
            let key = entry.key();
            let position = infos.partition_point(|info| (info.phase, info.priority) <= key);
            infos.insert(position, entry.info());
        }
        infos
    }

    /// Number of registered systems.
    pub(crate) fn len(&self) -> usize {
        self.systems.len() + self.pending.len()
    }
}

fn insert_sorted(systems: &mut Vec<ScheduledSystem>, entry: ScheduledSystem) {
    let key = entry.key();
    let position = systems.partition_point(|scheduled| scheduled.key() <= key);
    systems.insert(position, entry);
}

/// Outcome of one scheduler pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Tick number (1-based).
    pub tick: u64,
    /// Systems whose update ran.
    pub systems_run: u32,
    /// Pausible systems skipped because the world was paused.
    pub systems_skipped: u32,
    /// Whether the world was paused for this tick.
    pub paused: bool,
}
