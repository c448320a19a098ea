//! Engine binary for the Durdle simulation.
//!
//! This is the main entry point that wires the tick scheduler to the
//! configured task executors and drives them from a real-time frame loop.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `durdle-config.yaml` (or `DURDLE_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Create the tick scheduler from the clock config
//! 4. Build each executor, attach its reward listener and progress sink,
//!    and subscribe it to the scheduler
//! 5. Run the frame loop until a bound is reached or Ctrl-C
//! 6. Log the result and the final executor snapshots

mod error;
mod rewards;

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use durdle_core::clock::TickScheduler;
use durdle_core::config::{ExecutorConfig, SimulationConfig};
use durdle_core::executor::TaskExecutor;
use durdle_core::runner;
use durdle_core::task::TaskListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::error::EngineError;
use crate::rewards::{LogProgress, RewardListener};

/// Default configuration file, relative to the working directory.
const DEFAULT_CONFIG_PATH: &str = "durdle-config.yaml";

/// An executor wired into the scheduler, with its reward listener.
struct WiredExecutor {
    executor: Rc<RefCell<TaskExecutor>>,
    rewards: Rc<RewardListener>,
}

/// Application entry point for the engine.
///
/// # Errors
///
/// Returns an error if configuration, scheduler, or executor setup fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), EngineError> {
    // 1. Load configuration.
    let (config, config_path) = load_config()?;

    // 2. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_target(true)
        .init();

    info!("durdle-engine starting");
    match &config_path {
        Some(path) => info!(path = %path.display(), "Configuration loaded"),
        None => info!("Config file not found, using defaults"),
    }

    // 3. Create the tick scheduler.
    let mut scheduler = TickScheduler::new(&config.clock)?;
    info!(
        ticks_per_second = config.clock.ticks_per_second,
        tick_ms = scheduler.tick_duration().as_millis(),
        "Tick scheduler initialized"
    );

    // 4. Build and subscribe executors.
    let wired = wire_executors(&config.executors, &mut scheduler)?;
    if wired.is_empty() {
        warn!("No executors configured, ticks will have no effect");
    }

    // 5. Run the frame loop.
    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C, running until a bound is reached");
            std::future::pending::<()>().await;
        }
        info!("Shutdown requested");
    };
    let result = runner::run_simulation(&mut scheduler, &config.runner, shutdown).await;

    // 6. Log results.
    runner::log_simulation_end(&result);
    let mut total_rewards: u64 = 0;
    for entry in &wired {
        let snapshot = entry.executor.borrow().snapshot();
        let json = serde_json::to_string(&snapshot)?;
        total_rewards = total_rewards.saturating_add(entry.rewards.produced());
        info!(
            executor = %snapshot.name,
            rewards = entry.rewards.produced(),
            snapshot = %json,
            "Final executor state"
        );
    }

    info!(
        end_reason = ?result.end_reason,
        total_ticks = result.total_ticks,
        total_rewards,
        "durdle-engine shutdown complete"
    );

    Ok(())
}

/// Load the simulation configuration.
///
/// Reads `DURDLE_CONFIG` if set, otherwise `durdle-config.yaml` in the
/// working directory. Falls back to defaults when the file does not exist.
/// Returns the path that was loaded, if any.
fn load_config() -> Result<(SimulationConfig, Option<PathBuf>), EngineError> {
    let config_path = std::env::var_os("DURDLE_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if config_path.exists() {
        let config = SimulationConfig::from_file(&config_path)?;
        Ok((config, Some(config_path)))
    } else {
        Ok((SimulationConfig::default(), None))
    }
}

/// Build every configured executor and subscribe it to `scheduler`.
///
/// Each executor gets its own reward listener on all of its initial tasks
/// and a logging progress sink. Subscription order follows the config.
fn wire_executors(
    configs: &[ExecutorConfig],
    scheduler: &mut TickScheduler,
) -> Result<Vec<WiredExecutor>, EngineError> {
    let mut wired = Vec::with_capacity(configs.len());

    for config in configs {
        let mut executor = TaskExecutor::from_source(&config.name, config.speed, config)?
            .with_progress_sink(Box::new(LogProgress::new(&config.name)));

        let rewards = Rc::new(RewardListener::new(&config.name));
        let listener: Rc<dyn TaskListener> = rewards.clone();
        let attached = executor.attach_listener(&listener);

        let executor = Rc::new(RefCell::new(executor));
        let subscription = scheduler.subscribe(executor.clone());
        info!(
            executor = %config.name,
            speed = config.speed,
            tasks = attached,
            %subscription,
            "Executor subscribed"
        );

        wired.push(WiredExecutor { executor, rewards });
    }

    Ok(wired)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn wired_executors_produce_rewards_from_ticks() {
        let config = SimulationConfig::parse(
            "executors:\n  - name: quick\n    tasks:\n      - complete_time: 1.0\n        repeatable: true\n",
        )
        .unwrap();
        let mut scheduler = TickScheduler::new(&config.clock).unwrap();

        let wired = wire_executors(&config.executors, &mut scheduler).unwrap();
        assert_eq!(wired.len(), 1);
        assert_eq!(scheduler.subscriber_count(), 1);

        let _ = scheduler.on_frame(Duration::from_millis(3_500));
        assert_eq!(wired[0].rewards.produced(), 3);
        assert_eq!(wired[0].executor.borrow().completions(), 3);
    }

    #[test]
    fn invalid_executor_config_is_reported() {
        let config = SimulationConfig {
            executors: vec![ExecutorConfig {
                name: String::from("broken"),
                speed: f64::NAN,
                tasks: Vec::new(),
            }],
            ..SimulationConfig::default()
        };
        let mut scheduler = TickScheduler::new(&config.clock).unwrap();

        let result = wire_executors(&config.executors, &mut scheduler);
        assert!(matches!(result, Err(EngineError::Executor { .. })));
        assert_eq!(scheduler.subscriber_count(), 0);
    }
}
