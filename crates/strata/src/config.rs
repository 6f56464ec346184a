//! Application configuration, loaded from TOML.
//!
//! ```toml
//! frames = 240
//! entities = 128
//! pause_toggles = [60, 90]
//!
//! [world]
//! max_publish_depth = 32
//!
//! [game_loop]
//! target_fps = 120
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use strata_core::{EcsError, WorldConfig};
use thiserror::Error;

use crate::game_loop::GameLoopConfig;

/// Errors raised while loading the application config.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The document is not valid TOML for this schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value is out of range.
    #[error(transparent)]
    Invalid(#[from] EcsError),
}

/// Top-level configuration of the demo host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// World tunables.
    pub world: WorldConfig,
    /// Frame driver tunables.
    pub game_loop: GameLoopConfig,
    /// Number of frames to run before exiting.
    pub frames: u64,
    /// Number of entities the demo scenario spawns.
    pub entities: usize,
    /// Ticks on which the scripted pause key is pressed.
    pub pause_toggles: Vec<u64>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            game_loop: GameLoopConfig::default(),
            frames: 180,
            entities: 64,
            pause_toggles: vec![60, 90],
        }
    }
}

impl AppConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed documents and
    /// [`ConfigError::Invalid`] for out-of-range values.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.world.validate()?;
        if config.game_loop.target_fps == 0 {
            return Err(invalid("game_loop.target_fps must be greater than zero"));
        }
        if config.game_loop.max_delta.is_nan() || config.game_loop.max_delta <= 0.0 {
            return Err(invalid("game_loop.max_delta must be positive"));
        }
        Ok(config)
    }

    /// Loads the config at `path`, or the defaults when no path is given.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise the
    /// errors of [`AppConfig::from_toml_str`].
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }
}

fn invalid(reason: &str) -> ConfigError {
    ConfigError::Invalid(EcsError::InvalidConfig(reason.to_owned()))
}
