//! Task progress state machine.
//!
//! A [`Task`] is a unit of work that completes once a fixed amount of
//! progress time has been applied to it. Progress is applied by the task's
//! owner (normally a [`TaskExecutor`]) through [`Task::advance`].
//!
//! # Lifecycle
//!
//! - `Fresh` -> `InProgress` as soon as non-zero progress is applied.
//! - `InProgress` -> `Completed` when progress reaches `complete_time`.
//!   Overshoot is kept as *excess progress* for the owner to carry forward.
//! - `Completed` -> `Fresh` via [`Task::restart`], repeatable tasks only.
//! - Any state -> `Fresh` via [`Task::reset`].
//!
//! Listeners are notified synchronously. Each notification pass iterates
//! a snapshot of the registry taken before the first callback.
//!
//! [`TaskExecutor`]: crate::executor::TaskExecutor

use std::rc::Rc;

use durdle_types::{ListenerId, TaskEvent, TaskId, TaskSnapshot, TaskState};
use tracing::{debug, warn};

/// Why a restart request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestartRejection {
    /// The task was created as non-repeatable.
    NotRepeatable,
    /// The task has not reached its completion threshold yet.
    NotCompleted,
}

impl core::fmt::Display for RestartRejection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotRepeatable => f.write_str("task not repeatable"),
            Self::NotCompleted => f.write_str("task not completed"),
        }
    }
}

/// Errors that can occur during task operations.
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    /// The completion time is not a finite, positive number of seconds.
    #[error("invalid complete time {complete_time}: must be finite and positive")]
    InvalidCompleteTime {
        /// The rejected value.
        complete_time: f64,
    },

    /// [`Task::restart`] was called on a task that cannot be restarted.
    #[error("cannot restart task {task}: {reason}")]
    InvalidRestart {
        /// The task that rejected the restart.
        task: TaskId,
        /// Why the restart was rejected.
        reason: RestartRejection,
    },
}

/// Reacts to a [`Task`] changing state.
///
/// All methods default to doing nothing. Listeners are shared (`Rc`), so
/// implementations that record state need interior mutability.
///
/// A restart is reported through [`on_restart`](Self::on_restart) only;
/// [`on_reset`](Self::on_reset) is not called on the restart path even
/// though a restart also clears progress.
pub trait TaskListener {
    /// Called after the task is reset to its initial values.
    fn on_reset(&self, _task: &Task) {}

    /// Called after a repeatable task is restarted for a new cycle.
    fn on_restart(&self, _task: &Task) {}

    /// Called after the task reaches its completion threshold.
    fn on_complete(&self, _task: &Task) {}
}

/// A unit of work requiring a fixed amount of cumulative progress time.
#[derive(Clone)]
pub struct Task {
    /// Unique identifier.
    id: TaskId,

    /// Human-readable name used in logs.
    name: String,

    /// Progress (seconds) needed to complete. Always finite and positive.
    complete_time: f64,

    /// Whether the task may be restarted after completion.
    repeatable: bool,

    /// Cumulative progress applied so far.
    time_progress: f64,

    /// Whether the completion threshold was reached.
    completed: bool,

    /// Number of restarts since the last reset.
    repeats: u32,

    /// Registered listeners, in notification order.
    listeners: Vec<(ListenerId, Rc<dyn TaskListener>)>,
}

impl Task {
    /// Create a fresh task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::InvalidCompleteTime`] if `complete_time` is not
    /// finite and strictly positive.
    pub fn new(name: &str, complete_time: f64, repeatable: bool) -> Result<Self, TaskError> {
        if !complete_time.is_finite() || complete_time <= 0.0 {
            return Err(TaskError::InvalidCompleteTime { complete_time });
        }

        Ok(Self {
            id: TaskId::new(),
            name: name.to_owned(),
            complete_time,
            repeatable,
            time_progress: 0.0,
            completed: false,
            repeats: 0,
            listeners: Vec::new(),
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// Return the task's identifier.
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Return the task's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the progress (seconds) required to complete the task.
    pub const fn complete_time(&self) -> f64 {
        self.complete_time
    }

    /// Return whether the task may be restarted after completion.
    pub const fn is_repeatable(&self) -> bool {
        self.repeatable
    }

    /// Return whether the completion threshold has been reached.
    pub const fn is_completed(&self) -> bool {
        self.completed
    }

    /// Return whether [`restart`](Self::restart) would succeed right now.
    pub const fn can_restart(&self) -> bool {
        self.completed && self.repeatable
    }

    /// Return the number of restarts since creation or the last reset.
    pub const fn repeats(&self) -> u32 {
        self.repeats
    }

    /// Return the cumulative progress applied so far, in seconds.
    pub const fn time_progress(&self) -> f64 {
        self.time_progress
    }

    /// Return progress as a fraction of the completion time.
    ///
    /// Not clamped: overshoot reads above 1.0 and setbacks below 0.0.
    pub fn percent_progress(&self) -> f64 {
        self.time_progress / self.complete_time
    }

    /// Return progress applied beyond the completion time (never negative).
    pub fn excess_progress(&self) -> f64 {
        (self.time_progress - self.complete_time).max(0.0)
    }

    /// Derive the current lifecycle state.
    pub fn state(&self) -> TaskState {
        if self.completed {
            TaskState::Completed
        } else if self.time_progress == 0.0 {
            TaskState::Fresh
        } else {
            TaskState::InProgress
        }
    }

    /// Capture a serializable snapshot of the task.
    pub fn snapshot(&self) -> TaskSnapshot {
        TaskSnapshot {
            id: self.id,
            name: self.name.clone(),
            state: self.state(),
            complete_time: self.complete_time,
            time_progress: self.time_progress,
            repeatable: self.repeatable,
            repeats: self.repeats,
        }
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    /// Apply `time` seconds of progress. Negative values are setbacks.
    ///
    /// Reaching the completion time completes the task. The threshold check
    /// does not look at whether the task was already completed: a negative
    /// advance after completion lowers progress but leaves the task
    /// completed, and a later advance back over the threshold completes it
    /// (and notifies listeners) again. Non-finite input is ignored.
    pub fn advance(&mut self, time: f64) {
        if !time.is_finite() {
            warn!(task = %self.id, name = %self.name, time, "Ignoring non-finite advance");
            return;
        }

        self.time_progress += time;
        if self.time_progress >= self.complete_time {
            self.complete();
        }
    }

    /// Mark the task completed and notify listeners.
    ///
    /// Progress below the completion time is raised to it; overshoot is
    /// preserved as excess progress.
    pub fn complete(&mut self) {
        self.completed = true;
        self.time_progress = self.time_progress.max(self.complete_time);
        debug!(
            task = %self.id,
            name = %self.name,
            time_progress = self.time_progress,
            excess = self.excess_progress(),
            "Task completed"
        );
        self.notify(TaskEvent::Complete);
    }

    /// Return the task to its initial values and notify listeners.
    ///
    /// Valid in any state. Clears the repeat counter.
    pub fn reset(&mut self) {
        self.completed = false;
        self.time_progress = 0.0;
        self.repeats = 0;
        debug!(task = %self.id, name = %self.name, "Task reset");
        self.notify(TaskEvent::Reset);
    }

    /// Start a new cycle of a completed, repeatable task.
    ///
    /// Clears progress, increments the repeat counter, and notifies
    /// [`TaskListener::on_restart`]. Returns the new repeat count.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::InvalidRestart`] without touching any state if
    /// the task is not repeatable or not completed.
    pub fn restart(&mut self) -> Result<u32, TaskError> {
        let rejection = if !self.repeatable {
            Some(RestartRejection::NotRepeatable)
        } else if !self.completed {
            Some(RestartRejection::NotCompleted)
        } else {
            None
        };

        if let Some(reason) = rejection {
            debug!(task = %self.id, name = %self.name, %reason, "Restart rejected");
            return Err(TaskError::InvalidRestart {
                task: self.id,
                reason,
            });
        }

        self.completed = false;
        self.time_progress = 0.0;
        self.repeats = self.repeats.saturating_add(1);
        debug!(task = %self.id, name = %self.name, repeats = self.repeats, "Task restarted");
        self.notify(TaskEvent::Restart);
        Ok(self.repeats)
    }

    // -----------------------------------------------------------------------
    // Listener registry
    // -----------------------------------------------------------------------

    /// Register a listener. Listeners are notified in registration order.
    pub fn add_listener(&mut self, listener: Rc<dyn TaskListener>) -> ListenerId {
        let id = ListenerId::new();
        self.listeners.push((id, listener));
        id
    }

    /// Remove a listener registration. Returns `false` if the handle is unknown.
    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Replace every registered listener with `listeners`, keeping their order.
    ///
    /// Returns the handles of the new registrations.
    pub fn replace_listeners<I>(&mut self, listeners: I) -> Vec<ListenerId>
    where
        I: IntoIterator<Item = Rc<dyn TaskListener>>,
    {
        self.listeners.clear();
        listeners
            .into_iter()
            .map(|listener| self.add_listener(listener))
            .collect()
    }

    /// Return the number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Notify every listener of `event`.
    ///
    /// Iterates a snapshot so the pass is unaffected by registry changes.
    fn notify(&self, event: TaskEvent) {
        let snapshot: Vec<Rc<dyn TaskListener>> = self
            .listeners
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();

        for listener in &snapshot {
            match event {
                TaskEvent::Reset => listener.on_reset(self),
                TaskEvent::Restart => listener.on_restart(self),
                TaskEvent::Complete => listener.on_complete(self),
            }
        }
    }
}

impl core::fmt::Debug for Task {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("complete_time", &self.complete_time)
            .field("repeatable", &self.repeatable)
            .field("time_progress", &self.time_progress)
            .field("completed", &self.completed)
            .field("repeats", &self.repeats)
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
