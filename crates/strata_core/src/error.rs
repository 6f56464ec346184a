//! # Runtime Error Types
//!
//! Recoverable failures of the runtime. Programmer contract violations
//! (indexing an absent component, runaway publish recursion) panic instead.

use thiserror::Error;

use crate::ecs::Entity;

/// Errors that can occur in the runtime.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    /// Attempted to attach a component to an entity that is not alive.
    #[error("entity {0} is not alive")]
    DeadEntity(Entity),

    /// Checked access to a component row that does not exist.
    #[error("entity {entity} has no {component} component")]
    MissingComponent {
        /// The entity that was queried.
        entity: Entity,
        /// The component type name.
        component: &'static str,
    },

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for runtime operations.
pub type EcsResult<T> = Result<T, EcsError>;
