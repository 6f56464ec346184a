//! # STRATA Demo
//!
//! Headless run of the demonstration scenario.
//!
//! Usage: `strata_demo [config.toml]`
//!
//! Logging honours `RUST_LOG` (default `info`).

use std::path::PathBuf;

use strata::core::World;
use strata::demo;
use strata::{AppConfig, GameLoop};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() {
    init_tracing();

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = match AppConfig::load(config_path.as_deref()) {
        Ok(config) => config,
        Err(err) => {
            error!(error = %err, "config_load_failed");
            std::process::exit(1);
        }
    };

    let mut world = World::with_config(&config.world);
    let scenario = match demo::install(&mut world, &config) {
        Ok(scenario) => scenario,
        Err(err) => {
            error!(error = %err, "scenario_install_failed");
            std::process::exit(1);
        }
    };

    let delta = config.game_loop.fixed_delta();
    let mut game_loop = GameLoop::new(world, config.game_loop.clone());
    info!(frames = config.frames, delta, "running");

    for _ in 0..config.frames {
        game_loop.step(delta);
    }

    game_loop.stats().log_summary();
    info!(
        frames = game_loop.frame_count(),
        alive = game_loop.world().entity_count(),
        reaped = *scenario.reaped.borrow(),
        samples = scenario.probe.borrow().len(),
        "demo finished"
    );
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
