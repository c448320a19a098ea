//! Presentation-side consumers of simulation output.
//!
//! The engine has no renderer, so the sinks that would spawn a reward or
//! fill a progress bar log instead.

use std::cell::Cell;

use durdle_core::executor::ProgressSink;
use durdle_core::task::{Task, TaskListener};
use tracing::{debug, info, trace};

/// Task listener that "produces" one reward per completion.
#[derive(Debug)]
pub struct RewardListener {
    executor: String,
    produced: Cell<u64>,
}

impl RewardListener {
    /// Create a listener for tasks run by the named executor.
    pub fn new(executor: &str) -> Self {
        Self {
            executor: executor.to_owned(),
            produced: Cell::new(0),
        }
    }

    /// Return how many rewards have been produced.
    pub fn produced(&self) -> u64 {
        self.produced.get()
    }
}

impl TaskListener for RewardListener {
    fn on_reset(&self, task: &Task) {
        debug!(executor = %self.executor, task = task.name(), "Task reset");
    }

    fn on_restart(&self, task: &Task) {
        debug!(
            executor = %self.executor,
            task = task.name(),
            repeats = task.repeats(),
            "Task restarted"
        );
    }

    fn on_complete(&self, task: &Task) {
        let produced = self.produced.get().saturating_add(1);
        self.produced.set(produced);
        info!(
            executor = %self.executor,
            task = task.name(),
            excess = task.excess_progress(),
            produced,
            "Task complete, reward produced"
        );
    }
}

/// Progress sink that logs each report in whole percent.
#[derive(Debug)]
pub struct LogProgress {
    executor: String,
    last_percent: Option<u8>,
}

impl LogProgress {
    /// Create a sink for the named executor.
    pub fn new(executor: &str) -> Self {
        Self {
            executor: executor.to_owned(),
            last_percent: None,
        }
    }

    /// Return the last percentage logged.
    pub const fn last_percent(&self) -> Option<u8> {
        self.last_percent
    }
}

impl ProgressSink for LogProgress {
    fn report(&mut self, fraction: f64) {
        let percent = to_percent(fraction);
        if self.last_percent != Some(percent) {
            trace!(executor = %self.executor, percent, "Progress");
            self.last_percent = Some(percent);
        }
    }
}

/// Convert a `[0, 1]` fraction to a whole percentage, clamping stray input.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn to_percent(fraction: f64) -> u8 {
    // Clamped to [0, 100] before the cast, so it cannot truncate or wrap.
    (fraction.clamp(0.0, 1.0) * 100.0).round() as u8
}
