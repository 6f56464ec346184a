//! # STRATA
//!
//! Host side of the runtime: drives a [`strata_core::World`] frame by frame.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         STRATA HOST                          │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                              │
//! │  ┌──────────────┐   delta    ┌────────────────────────────┐  │
//! │  │  GameLoop    │──────────> │  strata_core::World        │  │
//! │  │              │            │                            │  │
//! │  │  • clamp     │ TickStats  │  • Input → PreUpdate →     │  │
//! │  │  • stats     │<────────── │    Update → Render         │  │
//! │  └──────────────┘            │  • events, pools, commands │  │
//! │                              └────────────────────────────┘  │
//! │                                                              │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: TOML application config
//! - `demo`: Demonstration scenario
//! - `game_loop`: Frame orchestration and timing

pub mod config;
pub mod demo;
pub mod game_loop;

// Re-export the runtime
pub use strata_core as core;

// Re-export commonly used types
pub use config::{AppConfig, ConfigError};
pub use game_loop::{FrameStats, FrameStatsAccumulator, GameLoop, GameLoopConfig};
