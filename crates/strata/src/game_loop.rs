//! # STRATA Game Loop
//!
//! The host side of a frame:
//! ```text
//! Frame N:
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │ 1. MEASURE                                                          │
//! │    └─ Wall-clock time since frame N-1, clamped to max_delta         │
//! │                                                                     │
//! │ 2. TICK                                                             │
//! │    └─ World::tick(delta): Input → PreUpdate → Update → Render       │
//! │                                                                     │
//! │ 3. RECORD                                                           │
//! │    ├─ Frame statistics into the accumulator                         │
//! │    └─ Warn on frames over budget                                    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`GameLoop::step`] skips the measurement and forwards an explicit delta,
//! which keeps tests and headless runs deterministic.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use strata_core::World;
use tracing::{info, warn};

/// Configuration for the game loop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GameLoopConfig {
    /// Target frames per second; sets the frame budget.
    pub target_fps: u32,
    /// Upper bound on the delta forwarded by [`GameLoop::run_frame`], in
    /// seconds. Long stalls (debugger, window drag) would otherwise arrive
    /// as one huge step.
    pub max_delta: f32,
    /// Log frames whose tick exceeds the budget.
    pub log_slow_frames: bool,
}

impl Default for GameLoopConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            max_delta: 0.1,
            log_slow_frames: true,
        }
    }
}

impl GameLoopConfig {
    /// Time budget of one frame.
    #[must_use]
    pub fn frame_budget(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.target_fps.max(1)))
    }

    /// Fixed delta matching the target frame rate, in seconds.
    #[must_use]
    pub fn fixed_delta(&self) -> f32 {
        1.0 / self.target_fps.max(1) as f32
    }
}

/// Frame timing statistics.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FrameStats {
    /// Frame number (0-based).
    pub frame: u64,
    /// Delta forwarded to the world, in seconds.
    pub delta_time: f32,
    /// Time spent inside `World::tick`, in microseconds.
    pub tick_us: u64,
    /// Systems whose update ran.
    pub systems_run: u32,
    /// Pausible systems skipped.
    pub systems_skipped: u32,
    /// Whether the world was paused for this frame.
    pub paused: bool,
}

/// The main loop orchestrator.
///
/// Owns the world and manages the frame lifecycle.
pub struct GameLoop {
    /// The simulation.
    world: World,
    /// Configuration.
    config: GameLoopConfig,
    /// Frame counter.
    frame_count: u64,
    /// Start of the previous `run_frame`, if any.
    last_frame_time: Option<Instant>,
    /// Accumulated frame statistics.
    stats_accumulator: FrameStatsAccumulator,
}

impl GameLoop {
    /// Creates a new game loop.
    ///
    /// # Arguments
    ///
    /// * `world` - World with its systems already registered
    /// * `config` - Configuration for the game loop
    #[must_use]
    pub fn new(world: World, config: GameLoopConfig) -> Self {
        Self {
            world,
            config,
            frame_count: 0,
            last_frame_time: None,
            stats_accumulator: FrameStatsAccumulator::new(),
        }
    }

    /// Runs one frame using the wall-clock time since the previous call.
    ///
    /// The first frame uses the fixed delta of the target frame rate.
    pub fn run_frame(&mut self) -> FrameStats {
        let now = Instant::now();
        let elapsed = self.last_frame_time.map_or_else(
            || self.config.fixed_delta(),
            |last| now.duration_since(last).as_secs_f32(),
        );
        self.last_frame_time = Some(now);

        // Clamp delta time to prevent a simulation explosion after a stall
        let delta_time = elapsed.min(self.config.max_delta);
        self.step(delta_time)
    }

    /// Runs one frame with an explicit delta, in seconds.
    pub fn step(&mut self, delta_time: f32) -> FrameStats {
        let started = Instant::now();
        let tick = self.world.tick(delta_time);
        let tick_us = micros(started.elapsed());

        let stats = FrameStats {
            frame: self.frame_count,
            delta_time,
            tick_us,
            systems_run: tick.systems_run,
            systems_skipped: tick.systems_skipped,
            paused: tick.paused,
        };
        self.end_frame(stats);
        stats
    }

    /// Records timing and prepares for the next frame.
    fn end_frame(&mut self, stats: FrameStats) {
        self.frame_count += 1;
        let budget_us = micros(self.config.frame_budget());
        self.stats_accumulator.record(stats, budget_us);

        // Log slow frames
        if self.config.log_slow_frames && stats.tick_us > budget_us {
            warn!(
                frame = stats.frame,
                tick_ms = stats.tick_us as f64 / 1000.0,
                budget_ms = budget_us as f64 / 1000.0,
                "frame exceeded budget"
            );
        }
    }

    /// Returns the current frame count.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// The simulated world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// The simulated world, mutably.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &GameLoopConfig {
        &self.config
    }

    /// Returns the accumulated statistics.
    #[must_use]
    pub fn stats(&self) -> &FrameStatsAccumulator {
        &self.stats_accumulator
    }

    /// Consumes the loop, returning the world.
    #[must_use]
    pub fn into_world(self) -> World {
        self.world
    }
}

fn micros(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

/// Accumulator for frame statistics.
#[derive(Clone, Debug)]
pub struct FrameStatsAccumulator {
    /// Total frames recorded.
    pub frames_recorded: u64,
    /// Sum of tick times.
    pub tick_us_sum: u64,
    /// Min tick time.
    pub min_tick_us: u64,
    /// Max tick time.
    pub max_tick_us: u64,
    /// Frames whose tick exceeded the budget.
    pub frames_over_budget: u64,
    /// Frames run while paused.
    pub paused_frames: u64,
    /// Pausible system updates skipped across all frames.
    pub systems_skipped: u64,
}

impl FrameStatsAccumulator {
    /// Creates a new accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            frames_recorded: 0,
            tick_us_sum: 0,
            min_tick_us: u64::MAX,
            max_tick_us: 0,
            frames_over_budget: 0,
            paused_frames: 0,
            systems_skipped: 0,
        }
    }

    /// Records a frame's statistics against a budget in microseconds.
    pub fn record(&mut self, stats: FrameStats, budget_us: u64) {
        self.frames_recorded += 1;
        self.tick_us_sum = self.tick_us_sum.saturating_add(stats.tick_us);
        self.min_tick_us = self.min_tick_us.min(stats.tick_us);
        self.max_tick_us = self.max_tick_us.max(stats.tick_us);
        self.systems_skipped += u64::from(stats.systems_skipped);

        if stats.paused {
            self.paused_frames += 1;
        }
        if stats.tick_us > budget_us {
            self.frames_over_budget += 1;
        }
    }

    /// Returns average tick time in milliseconds.
    #[must_use]
    pub fn avg_tick_ms(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        (self.tick_us_sum as f64 / self.frames_recorded as f64) / 1000.0
    }

    /// Returns the fraction of frames over budget.
    #[must_use]
    pub fn over_budget_ratio(&self) -> f64 {
        if self.frames_recorded == 0 {
            return 0.0;
        }
        self.frames_over_budget as f64 / self.frames_recorded as f64
    }

    /// Logs a summary of the statistics.
    pub fn log_summary(&self) {
        if self.frames_recorded == 0 {
            info!("no frames recorded");
            return;
        }
        info!(
            frames = self.frames_recorded,
            avg_tick_ms = self.avg_tick_ms(),
            min_tick_ms = self.min_tick_us as f64 / 1000.0,
            max_tick_ms = self.max_tick_us as f64 / 1000.0,
            over_budget = self.frames_over_budget,
            over_budget_pct = self.over_budget_ratio() * 100.0,
            paused_frames = self.paused_frames,
            systems_skipped = self.systems_skipped,
            "frame statistics"
        );
    }
}

impl Default for FrameStatsAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;
    use strata_core::{FnSystem, Phase};

    fn recording_world() -> (World, Rc<RefCell<Vec<f32>>>) {
        let deltas = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&deltas);
        let mut world = World::new();
        world.add_system(
            FnSystem::new("delta_recorder", move |_: &mut World, dt: f32| {
                sink.borrow_mut().push(dt);
            }),
            Phase::Update,
            0,
        );
        (world, deltas)
    }

    #[test]
    fn test_game_loop_creation() {
        let game_loop = GameLoop::new(World::new(), GameLoopConfig::default());
        assert_eq!(game_loop.frame_count(), 0);
        assert_eq!(game_loop.stats().frames_recorded, 0);
        assert_eq!(game_loop.world().current_tick(), 0);
    }

    #[test]
    fn test_step_forwards_delta() {
        let (world, deltas) = recording_world();
        let mut game_loop = GameLoop::new(world, GameLoopConfig::default());

        let first = game_loop.step(0.25);
        let second = game_loop.step(0.5);

        assert_eq!(first.frame, 0);
        assert_eq!(second.frame, 1);
        assert_eq!(second.systems_run, 1);
        assert_eq!(*deltas.borrow(), vec![0.25, 0.5]);
        assert_eq!(game_loop.frame_count(), 2);
        assert_eq!(game_loop.world().current_tick(), 2);
    }

    #[test]
    fn test_run_frame_clamps_delta() {
        let (world, deltas) = recording_world();
        let config = GameLoopConfig {
            max_delta: 0.001,
            ..GameLoopConfig::default()
        };
        let mut game_loop = GameLoop::new(world, config);

        game_loop.run_frame();
        std::thread::sleep(Duration::from_millis(5));
        game_loop.run_frame();

        assert_eq!(deltas.borrow().len(), 2);
        assert!(deltas.borrow().iter().all(|dt| *dt <= 0.001));
    }

    #[test]
    fn test_paused_frames_are_counted() {
        let (mut world, deltas) = recording_world();
        world.set_paused(true);
        let mut game_loop = GameLoop::new(world, GameLoopConfig::default());

        let stats = game_loop.step(0.1);
        assert!(stats.paused);
        assert_eq!(stats.systems_skipped, 1);
        assert!(deltas.borrow().is_empty());

        game_loop.world_mut().set_paused(false);
        game_loop.step(0.1);

        assert_eq!(game_loop.stats().paused_frames, 1);
        assert_eq!(game_loop.stats().systems_skipped, 1);
        assert_eq!(deltas.borrow().len(), 1);
    }

    #[test]
    fn test_accumulator() {
        let mut acc = FrameStatsAccumulator::new();
        assert_eq!(acc.avg_tick_ms(), 0.0);

        acc.record(
            FrameStats {
                tick_us: 1_000,
                ..FrameStats::default()
            },
            16_666,
        );
        acc.record(
            FrameStats {
                tick_us: 20_000,
                ..FrameStats::default()
            },
            16_666,
        );

        assert_eq!(acc.frames_recorded, 2);
        assert_eq!(acc.min_tick_us, 1_000);
        assert_eq!(acc.max_tick_us, 20_000);
        assert_eq!(acc.frames_over_budget, 1);
        assert!((acc.avg_tick_ms() - 10.5).abs() < 1e-9);
        assert!((acc.over_budget_ratio() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_frame_budget() {
        let config = GameLoopConfig::default();
        assert_eq!(config.frame_budget().as_micros(), 16_666);
        assert!((config.fixed_delta() - 1.0 / 60.0).abs() < f32::EPSILON);
    }
}
