//! # STRATA Core
//!
//! Single-threaded Entity Component System runtime for simulations and
//! games:
//! - Generational entity handles that never alias a destroyed entity
//! - One dense pool per component type
//! - Phased, prioritized system scheduling with pause support
//! - Synchronous, re-entrant typed events between systems
//!
//! ## Architecture Rules
//!
//! 1. **Systems never call each other** - They communicate through events
//! 2. **No structural change from a handler** - Queue it on a [`CommandQueue`]
//! 3. **Deterministic order** - Same registrations, same execution order
//!
//! ## Example
//!
//! ```rust
//! use strata_core::{Component, FnSystem, Phase, World};
//!
//! struct Position(f32);
//! impl Component for Position {}
//!
//! let mut world = World::new();
//! let e = world.create_entity();
//! world.insert(e, Position(0.0)).unwrap();
//!
//! world.add_system(
//!     FnSystem::new("drift", |world: &mut World, dt: f32| {
//!         world.pool_mut::<Position>().for_each(|_, pos| pos.0 += dt);
//!     }),
//!     Phase::Update,
//!     0,
//! );
//!
//! world.tick(0.5);
//! assert_eq!(world.get::<Position>(e).map(|p| p.0), Some(0.5));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod ecs;
pub mod error;

pub use config::WorldConfig;
pub use ecs::{
    Command, CommandBuffer, CommandQueue, Component, ComponentPool, ComponentRegistry, Entity,
    Event, EventBus, FnSystem, Phase, SubscriptionId, System, SystemId, SystemInfo, TickStats,
    World,
};
pub use error::{EcsError, EcsResult};
