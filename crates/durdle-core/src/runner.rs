//! Frame loop that drives a [`TickScheduler`] from real time.
//!
//! [`run_simulation`] samples a monotonic clock once per frame interval and
//! reports the elapsed time to the scheduler, which turns it into ticks.
//! The loop stops when a configured bound is reached or when the caller's
//! shutdown future resolves (e.g. Ctrl-C).
//!
//! The loop runs on the current task: subscribers are single-threaded
//! (`Rc`-shared), so nothing here is spawned.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, MissedTickBehavior};
use tracing::{info, warn};

use crate::clock::TickScheduler;
use crate::config::RunnerConfig;

/// Reason why the simulation loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    /// Reached the configured `max_ticks` limit.
    MaxTicksReached,
    /// Reached the configured `max_real_time_seconds` limit.
    MaxRealTimeReached,
    /// The shutdown future resolved.
    Shutdown,
}

/// Result of a simulation run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationResult {
    /// Why the loop ended.
    pub end_reason: EndReason,
    /// Ticks emitted by the scheduler when the loop ended.
    pub total_ticks: u64,
    /// Frames reported to the scheduler.
    pub frames: u64,
    /// Wall-clock time the loop ran for.
    pub elapsed: Duration,
}

/// Run the frame loop until a bound is reached or `shutdown` resolves.
///
/// Frame time is measured from the moment the loop starts; the scheduler is
/// expected to have its origin at zero. Frames that fall behind are skipped
/// rather than replayed, since the scheduler folds any backlog into the next
/// emission anyway.
pub async fn run_simulation<F>(
    scheduler: &mut TickScheduler,
    config: &RunnerConfig,
    shutdown: F,
) -> SimulationResult
where
    F: Future<Output = ()>,
{
    let frame_interval = Duration::from_millis(config.frame_interval_ms.max(1));
    let max_real_time = Duration::from_secs(config.max_real_time_seconds);

    info!(
        frame_interval_ms = frame_interval.as_millis(),
        tick_ms = scheduler.tick_duration().as_millis(),
        max_ticks = config.max_ticks,
        max_real_time_seconds = config.max_real_time_seconds,
        "Simulation starting"
    );

    let started = Instant::now();
    let mut interval = tokio::time::interval(frame_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    let mut frames: u64 = 0;
    let end_reason = loop {
        tokio::select! {
            biased;
            () = &mut shutdown => break EndReason::Shutdown,
            _ = interval.tick() => {}
        }

        let now = started.elapsed();
        let _ = scheduler.on_frame(now);
        frames = frames.saturating_add(1);

        if config.max_ticks > 0 && scheduler.total_ticks() >= config.max_ticks {
            break EndReason::MaxTicksReached;
        }
        if config.max_real_time_seconds > 0 && now >= max_real_time {
            break EndReason::MaxRealTimeReached;
        }
    };

    SimulationResult {
        end_reason,
        total_ticks: scheduler.total_ticks(),
        frames,
        elapsed: started.elapsed(),
    }
}

/// Log the outcome of a [`run_simulation`] call.
pub fn log_simulation_end(result: &SimulationResult) {
    info!(
        reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        frames = result.frames,
        elapsed_ms = result.elapsed.as_millis(),
        "Simulation ended"
    );

    if result.total_ticks == 0 {
        warn!("Simulation ended with no ticks emitted");
    }
}
