//! World configuration.
//!
//! Loaded from TOML by the host application; every field has a default so an
//! empty document is valid.
//!
//! ```toml
//! entity_capacity = 4096
//! max_publish_depth = 32
//! start_paused = false
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{EcsError, EcsResult};

/// Tunables for a [`World`](crate::World).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Entity slots reserved up front. The world still grows past this.
    pub entity_capacity: usize,
    /// Maximum nesting of synchronous publishes before the world panics.
    pub max_publish_depth: usize,
    /// Whether the world starts paused.
    pub start_paused: bool,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            entity_capacity: 1024,
            max_publish_depth: 64,
            start_paused: false,
        }
    }
}

impl WorldConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] on malformed TOML, unknown keys,
    /// or values rejected by [`WorldConfig::validate`].
    pub fn from_toml_str(source: &str) -> EcsResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|err| EcsError::InvalidConfig(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`EcsError::InvalidConfig`] if `max_publish_depth` is zero.
    pub fn validate(&self) -> EcsResult<()> {
        if self.max_publish_depth == 0 {
            return Err(EcsError::InvalidConfig(
                "max_publish_depth must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}
