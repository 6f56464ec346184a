//! # ECS World
//!
//! The central container for all entities, components, event handlers and
//! systems. Every system receives the world through its `initialize` and
//! `update` calls; there is no global instance, so independent worlds never
//! interfere.
//!
//! ## One Tick
//!
//! ```text
//! tick(dt)
//!   ├─ sample pause flag
//!   ├─ for each system (phase, priority, registration order):
//!   │    ├─ skip if paused && pausible
//!   │    └─ update(world, dt)  ── may publish ──> handlers run inline
//!   └─ merge systems registered during the tick (they run next tick)
//! ```

use tracing::{debug, trace};

use super::component::Component;
use super::entity::{Entity, EntityAllocator};
use super::event::{Event, EventBus, SubscriptionId};
use super::registry::ComponentRegistry;
use super::storage::ComponentPool;
use super::system::{Phase, ScheduledSystem, Scheduler, System, SystemId, SystemInfo, TickStats};
use crate::config::WorldConfig;
use crate::error::{EcsError, EcsResult};

/// The ECS World - container for all game state.
///
/// # Example
///
/// ```rust
/// use strata_core::{Component, Event, Phase, World};
///
/// struct Score(u32);
/// impl Component for Score {}
///
/// struct Scored;
/// impl Event for Scored {}
///
/// let mut world = World::new();
/// let player = world.create_entity();
/// world.insert(player, Score(0)).unwrap();
///
/// world.subscribe(move |world: &mut World, _: &Scored| {
///     if let Some(score) = world.get_mut::<Score>(player) {
///         score.0 += 1;
///     }
/// });
///
/// world.publish(Scored);
/// assert_eq!(world.get::<Score>(player).map(|s| s.0), Some(1));
/// ```
pub struct World {
    /// Live entity bookkeeping.
    entities: EntityAllocator,
    /// One pool per component type.
    components: ComponentRegistry,
    /// Event handlers.
    events: EventBus,
    /// Registered systems in execution order.
    scheduler: Scheduler,
    /// Pausible systems are skipped while set.
    paused: bool,
    /// Number of the tick in progress, or of the last completed tick.
    tick: u64,
}

impl World {
    /// Creates a world with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(&WorldConfig::default())
    }

    /// Creates a world from a configuration.
    #[must_use]
    pub fn with_config(config: &WorldConfig) -> Self {
        Self {
            entities: EntityAllocator::with_capacity(config.entity_capacity),
            components: ComponentRegistry::new(),
            events: EventBus::new(config.max_publish_depth),
            scheduler: Scheduler::default(),
            paused: config.start_paused,
            tick: 0,
        }
    }

    // =========================================================================
    // Entity lifecycle
    // =========================================================================

    /// Allocates a fresh entity with no components.
    pub fn create_entity(&mut self) -> Entity {
        let entity = self.entities.allocate();
        trace!(%entity, "created entity");
        entity
    }

    /// Destroys an entity and removes its row from every pool.
    ///
    /// Each pool holding a row pays the O(n) cost of
    /// [`ComponentPool::remove`].
    ///
    /// From inside an event handler, prefer queueing the destruction on a
    /// [`CommandQueue`](crate::CommandQueue) so snapshots taken earlier in the
    /// frame stay consistent.
    ///
    /// # Returns
    ///
    /// `false` if the entity was already destroyed (a no-op).
    pub fn destroy_entity(&mut self, entity: Entity) -> bool {
        if !self.entities.free(entity) {
            trace!(%entity, "destroy ignored, entity is not alive");
            return false;
        }

        let rows = self.components.remove_all(entity);
        trace!(%entity, rows, "destroyed entity");
        true
    }

    /// Checks if an entity is alive.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities.is_alive(entity)
    }

    /// Number of live entities.
    #[inline]
    #[must_use]
    pub fn entity_count(&self) -> usize {
        self.entities.alive_count()
    }

    /// Snapshot of all live entities, in ascending slot order.
    ///
    /// The snapshot is detached from the world: destroying or creating
    /// entities while walking it is safe.
    #[must_use]
    pub fn entities(&self) -> Vec<Entity> {
        self.entities.iter_alive().collect()
    }

    /// Snapshot of the entities holding a `C`, in pool insertion order.
    #[must_use]
    pub fn entities_with<C: Component>(&self) -> Vec<Entity> {
        self.components
            .pool::<C>()
            .map(|pool| pool.entities().to_vec())
            .unwrap_or_default()
    }

    // =========================================================================
    // Components
    // =========================================================================

    /// Returns the pool for `C` if it has been created.
    #[must_use]
    pub fn pool<C: Component>(&self) -> Option<&ComponentPool<C>> {
        self.components.pool::<C>()
    }

    /// Returns the pool for `C`, creating it on first use.
    ///
    /// Rows written directly through the pool are not checked for entity
    /// liveness; [`World::insert`] is.
    pub fn pool_mut<C: Component>(&mut self) -> &mut ComponentPool<C> {
        self.components.pool_mut::<C>()
    }

    /// Returns disjoint mutable access to two different pools.
    ///
    /// # Panics
    ///
    /// Panics if `A` and `B` are the same type.
    pub fn pool_pair_mut<A: Component, B: Component>(
        &mut self,
    ) -> (&mut ComponentPool<A>, &mut ComponentPool<B>) {
        self.components.pool_pair_mut::<A, B>()
    }

    /// The component registry.
    #[must_use]
    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    /// The component registry, mutably.
    pub fn components_mut(&mut self) -> &mut ComponentRegistry {
        &mut self.components
    }

    /// Checks whether `entity` has a `C`.
    #[must_use]
    pub fn has<C: Component>(&self, entity: Entity) -> bool {
        self.components.has::<C>(entity)
    }

    /// Gets the `C` of `entity`.
    #[must_use]
    pub fn get<C: Component>(&self, entity: Entity) -> Option<&C> {
        self.components.pool::<C>().and_then(|pool| pool.get(entity))
    }

    /// Gets the `C` of `entity` mutably.
    pub fn get_mut<C: Component>(&mut self, entity: Entity) -> Option<&mut C> {
        self.components.pool_mut::<C>().get_mut(entity)
    }

    /// Attaches (or overwrites) a component.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::DeadEntity`] if `entity` is not alive; a row for
    /// a dead entity would survive its destruction.
    ///
    /// # Returns
    ///
    /// The previous value, if any.
    pub fn insert<C: Component>(&mut self, entity: Entity, component: C) -> EcsResult<Option<C>> {
        if !self.entities.is_alive(entity) {
            return Err(EcsError::DeadEntity(entity));
        }
        Ok(self.components.pool_mut::<C>().set(entity, component))
    }

    /// Detaches a component. Absent rows are a no-op.
    pub fn remove<C: Component>(&mut self, entity: Entity) -> Option<C> {
        self.components.pool_mut::<C>().remove(entity)
    }

    // =========================================================================
    // Events
    // =========================================================================

    /// Registers a handler for events of type `E`.
    ///
    /// Handlers run synchronously inside [`World::publish`], in subscription
    /// order.
    pub fn subscribe<E, F>(&mut self, handler: F) -> SubscriptionId
    where
        E: Event,
        F: Fn(&mut World, &E) + 'static,
    {
        self.events.subscribe(handler)
    }

    /// Removes a subscription. Returns `false` if it was unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Delivers `event` to every handler subscribed to `E`.
    ///
    /// Returns after every handler has run. The handler list is captured
    /// when the publish starts: subscriptions made during delivery see the
    /// next publish, unsubscriptions made during delivery do not stop this
    /// one. Publishing with no subscribers is a no-op.
    ///
    /// # Panics
    ///
    /// Panics if nested publishes exceed the configured maximum depth.
    ///
    /// # Returns
    ///
    /// The number of handlers invoked.
    pub fn publish<E: Event>(&mut self, event: E) -> usize {
        let handlers = self.events.snapshot::<E>();
        if handlers.is_empty() {
            trace!(event = E::event_name(), "published with no subscribers");
            return 0;
        }

        self.events.enter::<E>();
        trace!(
            event = E::event_name(),
            handlers = handlers.len(),
            depth = self.events.depth(),
            "publishing"
        );
        for handler in &handlers {
            (**handler)(self, &event);
        }
        self.events.exit();

        handlers.len()
    }

    /// Current nesting of in-flight publishes (0 outside any handler).
    #[must_use]
    pub fn publish_depth(&self) -> usize {
        self.events.depth()
    }

    /// The event bus.
    #[must_use]
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    // =========================================================================
    // Systems
    // =========================================================================

    /// Registers a system and initializes it.
    ///
    /// Systems sharing a phase run in ascending `priority`; equal priorities
    /// run in registration order. A system registered from inside a tick
    /// first runs on the next tick.
    pub fn add_system<S>(&mut self, system: S, phase: Phase, priority: i32) -> SystemId
    where
        S: System + 'static,
    {
        self.add_boxed_system(Box::new(system), phase, priority)
    }

    /// Registers an already boxed system.
    ///
    /// The system takes its place in the schedule before `initialize` runs,
    /// so a system registered from inside `initialize` with the same
    /// (phase, priority) runs after it.
    pub fn add_boxed_system(
        &mut self,
        mut system: Box<dyn System>,
        phase: Phase,
        priority: i32,
    ) -> SystemId {
        let id = self.scheduler.next_id();
        self.scheduler.insert(ScheduledSystem::reserve(id, phase, priority, &*system));
        system.initialize(self);
        debug!(
            system = system.name(),
            %phase,
            priority,
            pausible = system.pausible(),
            "registered system"
        );
        self.scheduler.attach(id, system);
        id
    }

    /// Schedule rows in execution order.
    ///
    /// Systems registered during a tick are listed already, at the position
    /// they run from on the next tick.
    #[must_use]
    pub fn schedule(&self) -> Vec<SystemInfo> {
        self.scheduler.infos()
    }

    /// Number of registered systems.
    #[must_use]
    pub fn system_count(&self) -> usize {
        self.scheduler.len()
    }

    /// Pauses or resumes pausible systems, starting with the next tick.
    pub fn set_paused(&mut self, paused: bool) {
        if self.paused != paused {
            debug!(paused, tick = self.tick, "pause flag changed");
        }
        self.paused = paused;
    }

    /// Returns the pause flag.
    #[inline]
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Number of the tick in progress, or of the last completed tick.
    /// 0 before the first tick.
    #[inline]
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Runs one scheduler pass, forwarding `delta_time` to every system.
    ///
    /// The pause flag is sampled once, at the start of the pass.
    pub fn tick(&mut self, delta_time: f32) -> TickStats {
        self.tick += 1;
        let mut stats = TickStats {
            tick: self.tick,
            paused: self.paused,
            ..TickStats::default()
        };

        // Each system is taken out of its slot while it runs so it can
        // receive `&mut self`; registrations wait until `end_tick`.
        self.scheduler.begin_tick();
        for index in 0..self.scheduler.systems.len() {
            let scheduled = &mut self.scheduler.systems[index];
            if stats.paused && scheduled.pausible {
                stats.systems_skipped += 1;
                continue;
            }
            // Empty while this system's own update or initialize is on the stack
            let Some(mut system) = scheduled.system.take() else {
                continue;
            };

            trace!(
                system = scheduled.name.as_str(),
                phase = %scheduled.phase,
                priority = scheduled.priority,
                "update"
            );
            system.update(self, delta_time);
            self.scheduler.systems[index].system = Some(system);
            stats.systems_run += 1;
        }
        self.scheduler.end_tick();

        trace!(
            tick = stats.tick,
            run = stats.systems_run,
            skipped = stats.systems_skipped,
            "tick complete"
        );
        stats
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("entities", &self.entities.alive_count())
            .field("pools", &self.components.pool_count())
            .field("systems", &self.scheduler.len())
            .field("events", &self.events)
            .field("paused", &self.paused)
            .field("tick", &self.tick)
            .finish()
    }
}
