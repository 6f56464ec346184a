//! # Entity Component System
//!
//! Entities are plain generational handles, components are plain data kept
//! in one pool per type, and behavior lives in systems driven by the
//! [`World`] tick.
//!
//! ## Design Philosophy
//!
//! - Entity handles are never reused: a recycled slot gets a new generation
//! - Components are stored in dense arrays, iterated in insertion order
//! - Systems talk through synchronous typed events, never through each other
//! - Structural changes from handlers are deferred through a [`CommandQueue`]

mod command;
mod component;
mod entity;
mod event;
mod registry;
mod storage;
mod system;
mod world;

pub use command::{Command, CommandBuffer, CommandQueue};
pub use component::Component;
pub use entity::Entity;
pub use event::{Event, EventBus, SubscriptionId};
pub use registry::ComponentRegistry;
pub use storage::ComponentPool;
pub use system::{FnSystem, Phase, System, SystemId, SystemInfo, TickStats};
pub use world::World;
