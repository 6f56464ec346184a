//! # Deferred Commands
//!
//! Structural mutation requested from inside an event handler is queued
//! here and applied later, at a fixed point in the owning system's update:
//!
//! ```text
//! event ──> handler ──> queue.destroy(e)        (no structural change)
//!                             │
//! owning system update ──> queue.apply(world)   (batched application)
//! ```
//!
//! An entity snapshot taken by any system earlier in the frame therefore
//! never observes a handler's destruction mid-iteration.

use std::any::TypeId;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::component::Component;
use super::entity::Entity;
use super::world::World;
use crate::error::EcsResult;

/// A deferred structural mutation.
pub enum Command {
    /// Destroy the entity and cascade to every pool.
    Destroy(Entity),
    /// Remove one component row.
    RemoveComponent {
        /// Target entity.
        entity: Entity,
        /// Pool of the component.
        component: TypeId,
        /// Component type name, for logs.
        name: &'static str,
    },
    /// Insert or overwrite one component row.
    Insert {
        /// Target entity.
        entity: Entity,
        /// Component type name, for logs.
        name: &'static str,
        /// Typed write, failing if the entity died in the meantime.
        write: Box<dyn FnOnce(&mut World) -> EcsResult<()>>,
    },
    /// Any other mutation.
    Apply(Box<dyn FnOnce(&mut World)>),
}

impl Command {
    /// Applies the command to `world`.
    pub fn apply(self, world: &mut World) {
        match self {
            Self::Destroy(entity) => {
                world.destroy_entity(entity);
            }
            Self::RemoveComponent {
                entity,
                component,
                name,
            } => {
                if !world.components_mut().remove_erased(component, entity) {
                    tracing::trace!(%entity, component = name, "deferred remove found no row");
                }
            }
            Self::Insert {
                entity,
                name,
                write,
            } => {
                if let Err(err) = write(world) {
                    tracing::warn!(%entity, component = name, %err, "skipping deferred insert");
                }
            }
            Self::Apply(mutation) => mutation(world),
        }
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Destroy(entity) => f.debug_tuple("Destroy").field(entity).finish(),
            Self::RemoveComponent { entity, name, .. } => f
                .debug_struct("RemoveComponent")
                .field("entity", entity)
                .field("component", name)
                .finish(),
            Self::Insert { entity, name, .. } => f
                .debug_struct("Insert")
                .field("entity", entity)
                .field("component", name)
                .finish(),
            Self::Apply(_) => f.write_str("Apply(..)"),
        }
    }
}

/// An owned FIFO of deferred commands.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    commands: Vec<Command>,
}

impl CommandBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending commands.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if nothing is pending.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Queues a raw command.
    pub fn push(&mut self, command: Command) {
        self.commands.push(command);
    }

    /// Queues the destruction of `entity`.
    pub fn destroy(&mut self, entity: Entity) {
        self.push(Command::Destroy(entity));
    }

    /// Queues removal of the `C` component of `entity`.
    pub fn remove<C: Component>(&mut self, entity: Entity) {
        self.push(Command::RemoveComponent {
            entity,
            component: TypeId::of::<C>(),
            name: C::component_name(),
        });
    }

    /// Queues insertion (or overwrite) of a component.
    ///
    /// Skipped with a warning if `entity` is no longer alive when applied.
    pub fn insert<C: Component>(&mut self, entity: Entity, component: C) {
        self.push(Command::Insert {
            entity,
            name: C::component_name(),
            write: Box::new(move |world: &mut World| world.insert(entity, component).map(drop)),
        });
    }

    /// Queues an arbitrary mutation.
    pub fn run<F>(&mut self, mutation: F)
    where
        F: FnOnce(&mut World) + 'static,
    {
        self.push(Command::Apply(Box::new(mutation)));
    }

    /// Applies every pending command in FIFO order.
    ///
    /// # Returns
    ///
    /// The number of commands applied.
    pub fn apply(&mut self, world: &mut World) -> usize {
        let pending = std::mem::take(&mut self.commands);
        let count = pending.len();
        for command in pending {
            command.apply(world);
        }
        count
    }

    /// Drops every pending command without applying it.
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

/// A shared handle to a [`CommandBuffer`].
///
/// The owning system keeps one clone and moves another into each event
/// handler it subscribes. Handlers only enqueue; the system applies the
/// queue during its own update.
///
/// # Example
///
/// ```rust
/// use strata_core::{CommandQueue, Event, Entity, System, World};
///
/// struct Killed(Entity);
/// impl Event for Killed {}
///
/// #[derive(Default)]
/// struct Reaper {
///     pending: CommandQueue,
/// }
///
/// impl System for Reaper {
///     fn initialize(&mut self, world: &mut World) {
///         let pending = self.pending.clone();
///         world.subscribe(move |_: &mut World, event: &Killed| pending.destroy(event.0));
///     }
///
///     fn update(&mut self, world: &mut World, _delta_time: f32) {
///         self.pending.apply(world);
///     }
/// }
/// ```
#[derive(Clone, Default)]
pub struct CommandQueue {
    inner: Rc<RefCell<CommandBuffer>>,
}

impl CommandQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of pending commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Returns `true` if nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    /// Queues a raw command.
    pub fn push(&self, command: Command) {
        self.inner.borrow_mut().push(command);
    }

    /// Queues the destruction of `entity`.
    pub fn destroy(&self, entity: Entity) {
        self.inner.borrow_mut().destroy(entity);
    }

    /// Queues removal of the `C` component of `entity`.
    pub fn remove<C: Component>(&self, entity: Entity) {
        self.inner.borrow_mut().remove::<C>(entity);
    }

    /// Queues insertion (or overwrite) of a component.
    pub fn insert<C: Component>(&self, entity: Entity, component: C) {
        self.inner.borrow_mut().insert(entity, component);
    }

    /// Queues an arbitrary mutation.
    pub fn run<F>(&self, mutation: F)
    where
        F: FnOnce(&mut World) + 'static,
    {
        self.inner.borrow_mut().run(mutation);
    }

    /// Applies every command pending at call time.
    ///
    /// The buffer is detached before applying, so commands enqueued by
    /// handlers that fire during application wait for the next call.
    ///
    /// # Returns
    ///
    /// The number of commands applied.
    pub fn apply(&self, world: &mut World) -> usize {
        let mut pending = std::mem::take(&mut *self.inner.borrow_mut());
        pending.apply(world)
    }
}

impl fmt::Debug for CommandQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandQueue")
            .field("pending", &self.len())
            .finish()
    }
}
