//! Task executors: actors that drain tick time into a queue of tasks.
//!
//! A [`TaskExecutor`] owns a FIFO queue of [`Task`]s and is itself a
//! [`TickReceiver`]. Each tick's time (scaled by the executor's speed) is
//! applied to the head task. When the head completes, the time it did not
//! need flows into the next task in the same tick; repeatable tasks are
//! restarted and moved to the back of the queue.
//!
//! Executors are configured by composition rather than subtyping: the
//! speed multiplier is a field, the initial queue comes from a
//! [`TaskSource`], and progress reporting goes to an optional
//! [`ProgressSink`].

use std::collections::VecDeque;
use std::rc::Rc;

use durdle_types::{ExecutorId, ExecutorSnapshot};
use tracing::{debug, trace, warn};

use crate::clock::TickReceiver;
use crate::task::{Task, TaskError, TaskListener};

/// Upper bound on task completions in one [`TaskExecutor::work_on_task`]
/// call. Time still pending when it is reached is discarded.
pub const MAX_COMPLETIONS_PER_DRAIN: u32 = 100_000;

/// Errors that can occur when building an executor.
#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    /// The speed multiplier is negative or not finite.
    #[error("invalid executor speed {speed}: must be finite and non-negative")]
    InvalidSpeed {
        /// The rejected value.
        speed: f64,
    },

    /// A task produced by the task source was invalid.
    #[error("task error: {source}")]
    Task {
        /// The underlying task error.
        #[from]
        source: TaskError,
    },
}

/// Consumer of head-task progress, such as a progress bar.
///
/// Receives a fraction in `[0, 1]` once per tick: the head task's progress,
/// or 0 when the queue is empty.
pub trait ProgressSink {
    /// Accept the latest progress fraction.
    fn report(&mut self, fraction: f64);
}

/// Strategy that supplies an executor's initial queue.
pub trait TaskSource {
    /// Build the tasks to enqueue, head first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError`] if a task cannot be constructed.
    fn initial_tasks(&self) -> Result<Vec<Task>, TaskError>;
}

/// A single repeatable task that cycles forever.
#[derive(Debug, Clone, PartialEq)]
pub struct RepeatingTask {
    /// Name given to the task.
    pub name: String,
    /// Seconds of progress per cycle.
    pub length: f64,
}

impl TaskSource for RepeatingTask {
    fn initial_tasks(&self) -> Result<Vec<Task>, TaskError> {
        Ok(vec![Task::new(&self.name, self.length, true)?])
    }
}

/// What one call to [`TaskExecutor::work_on_task`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WorkReport {
    /// Time absorbed by tasks.
    pub applied: f64,
    /// Time dropped because the queue ran out of tasks.
    pub discarded: f64,
    /// Number of task completions (restarted tasks count once per cycle).
    pub completed: u32,
}

/// An actor that works through an ordered queue of tasks.
pub struct TaskExecutor {
    /// Unique identifier.
    id: ExecutorId,

    /// Human-readable name used in logs.
    name: String,

    /// Throughput multiplier applied to incoming ticks.
    speed: f64,

    /// Execution order. Only the front task receives time.
    queue: VecDeque<Task>,

    /// Optional consumer of head-task progress.
    sink: Option<Box<dyn ProgressSink>>,

    /// Total completions observed since construction.
    completions: u64,
}

impl TaskExecutor {
    /// Create an executor with an empty queue.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError::InvalidSpeed`] if `speed` is negative or not
    /// finite.
    pub fn new(name: &str, speed: f64) -> Result<Self, ExecutorError> {
        if !speed.is_finite() || speed < 0.0 {
            return Err(ExecutorError::InvalidSpeed { speed });
        }

        Ok(Self {
            id: ExecutorId::new(),
            name: name.to_owned(),
            speed,
            queue: VecDeque::new(),
            sink: None,
            completions: 0,
        })
    }

    /// Create an executor whose queue is seeded from `source`.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutorError`] if the speed is invalid or the source
    /// fails to build its tasks.
    pub fn from_source(
        name: &str,
        speed: f64,
        source: &dyn TaskSource,
    ) -> Result<Self, ExecutorError> {
        let mut executor = Self::new(name, speed)?;
        for task in source.initial_tasks()? {
            executor.enqueue(task);
        }
        Ok(executor)
    }

    /// Attach a progress sink, replacing any previous one.
    pub fn set_progress_sink(&mut self, sink: Box<dyn ProgressSink>) {
        self.sink = Some(sink);
    }

    /// Builder form of [`set_progress_sink`](Self::set_progress_sink).
    #[must_use]
    pub fn with_progress_sink(mut self, sink: Box<dyn ProgressSink>) -> Self {
        self.set_progress_sink(sink);
        self
    }

    /// Append a task to the back of the queue.
    pub fn enqueue(&mut self, task: Task) {
        debug!(
            executor = %self.id,
            task = %task.id(),
            name = %task.name(),
            position = self.queue.len(),
            "Task enqueued"
        );
        self.queue.push_back(task);
    }

    /// Register `listener` on every task currently queued.
    ///
    /// Returns the number of tasks the listener was added to.
    pub fn attach_listener(&mut self, listener: &Rc<dyn TaskListener>) -> usize {
        for task in &mut self.queue {
            task.add_listener(Rc::clone(listener));
        }
        self.queue.len()
    }

    /// Drain `time` seconds of work into the queue.
    ///
    /// The head task receives the time; if it completes, its excess flows
    /// into the next head within the same call. Completed tasks leave the
    /// queue, and repeatable ones are restarted and re-appended. Time left
    /// over once the queue is empty is discarded, as is time left after
    /// [`MAX_COMPLETIONS_PER_DRAIN`] completions or after a repeatable task
    /// completes without consuming any of it. Non-positive or non-finite
    /// time does nothing.
    pub fn work_on_task(&mut self, time: f64) -> WorkReport {
        let mut report = WorkReport::default();
        if !time.is_finite() || time <= 0.0 {
            return report;
        }

        let mut remaining = time;
        while remaining > 0.0 {
            let Some(head) = self.queue.front_mut() else {
                debug!(
                    executor = %self.id,
                    discarded = remaining,
                    "Task queue empty, discarding remaining time"
                );
                report.discarded = remaining;
                break;
            };

            let was_completed = head.is_completed();
            head.advance(remaining);
            let excess = head.excess_progress();
            // A task too short to register against `remaining` in f64 leaves
            // the excess unchanged; requeueing it would never terminate.
            let stalled = !was_completed && head.is_completed() && excess >= remaining;
            report.applied += remaining - excess;
            remaining = excess;

            if !head.is_completed() {
                break;
            }

            let Some(mut finished) = self.queue.pop_front() else {
                break;
            };
            report.completed = report.completed.saturating_add(1);
            self.completions = self.completions.saturating_add(1);

            let requeued = finished.can_restart();
            if requeued {
                match finished.restart() {
                    Ok(_) => self.queue.push_back(finished),
                    Err(err) => warn!(executor = %self.id, error = %err, "Dropping task"),
                }
            } else {
                debug!(
                    executor = %self.id,
                    task = %finished.id(),
                    name = %finished.name(),
                    "Task finished and left the queue"
                );
            }

            let stalled = stalled && requeued;
            if remaining > 0.0 && (stalled || report.completed >= MAX_COMPLETIONS_PER_DRAIN) {
                warn!(
                    executor = %self.id,
                    discarded = remaining,
                    completed = report.completed,
                    stalled,
                    "Drain limit reached, discarding remaining time"
                );
                report.discarded = remaining;
                break;
            }
        }

        report
    }

    /// Return the head task's progress clamped to `[0, 1]`, or 0 if the
    /// queue is empty.
    pub fn head_progress(&self) -> f64 {
        self.queue
            .front()
            .map_or(0.0, |task| task.percent_progress().clamp(0.0, 1.0))
    }

    /// Push the current head progress to the sink, if one is attached.
    fn update_progress(&mut self) {
        let fraction = self.head_progress();
        if let Some(sink) = self.sink.as_mut() {
            sink.report(fraction);
        }
    }

    /// Return the executor's identifier.
    pub const fn id(&self) -> ExecutorId {
        self.id
    }

    /// Return the executor's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the throughput multiplier.
    pub const fn speed(&self) -> f64 {
        self.speed
    }

    /// Return the total number of completions since construction.
    pub const fn completions(&self) -> u64 {
        self.completions
    }

    /// Return the task at the head of the queue.
    pub fn head(&self) -> Option<&Task> {
        self.queue.front()
    }

    /// Iterate over queued tasks, head first.
    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.queue.iter()
    }

    /// Return the number of queued tasks.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Return whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Capture a serializable snapshot of the executor and its queue.
    pub fn snapshot(&self) -> ExecutorSnapshot {
        ExecutorSnapshot {
            id: self.id,
            name: self.name.clone(),
            speed: self.speed,
            queue: self.queue.iter().map(Task::snapshot).collect(),
            completions: self.completions,
        }
    }
}

impl TickReceiver for TaskExecutor {
    fn tick(&mut self, elapsed: f64) {
        let report = self.work_on_task(elapsed * self.speed);
        trace!(
            executor = %self.id,
            elapsed,
            applied = report.applied,
            completed = report.completed,
            "Executor ticked"
        );
        self.update_progress();
    }
}

impl core::fmt::Debug for TaskExecutor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TaskExecutor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("speed", &self.speed)
            .field("queue", &self.queue)
            .field("has_sink", &self.sink.is_some())
            .field("completions", &self.completions)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use durdle_types::{TaskEvent, TaskState};

    use super::*;
    use crate::listener::{ProgressGauge, TaskEventLog};

    fn task(name: &str, complete_time: f64, repeatable: bool) -> Task {
        Task::new(name, complete_time, repeatable).unwrap()
    }

    fn executor_with(tasks: Vec<Task>) -> (TaskExecutor, ProgressGauge) {
        let gauge = ProgressGauge::new();
        let mut executor = TaskExecutor::new("computer", 1.0)
            .unwrap()
            .with_progress_sink(Box::new(gauge.clone()));
        for t in tasks {
            executor.enqueue(t);
        }
        (executor, gauge)
    }

    #[test]
    fn rejects_invalid_speed() {
        assert!(TaskExecutor::new("neg", -1.0).is_err());
        assert!(TaskExecutor::new("nan", f64::NAN).is_err());
        assert!(TaskExecutor::new("stopped", 0.0).is_ok());
    }

    #[test]
    fn one_tick_completes_two_queued_tasks() {
        let (mut executor, gauge) =
            executor_with(vec![task("short", 3.0, false), task("long", 5.0, false)]);

        executor.tick(8.0);

        assert!(executor.is_empty());
        assert_eq!(executor.completions(), 2);
        assert_eq!(gauge.value(), 0.0);
        assert_eq!(gauge.updates(), 1);
    }

    #[test]
    fn excess_flows_into_next_task() {
        let (mut executor, gauge) =
            executor_with(vec![task("first", 3.0, false), task("second", 5.0, false)]);

        let report = executor.work_on_task(4.0);
        assert_eq!(report.completed, 1);
        assert_eq!(report.applied, 4.0);
        assert_eq!(report.discarded, 0.0);

        let head = executor.head().unwrap();
        assert_eq!(head.name(), "second");
        assert_eq!(head.time_progress(), 1.0);
        // The sink is only refreshed by ticks.
        assert_eq!(gauge.updates(), 0);
    }

    #[test]
    fn repeatable_task_cycles_within_one_tick() {
        let (mut executor, _gauge) = executor_with(vec![task("durdle", 2.0, true)]);
        let log = Rc::new(TaskEventLog::new());
        let listener: Rc<dyn TaskListener> = log.clone();
        assert_eq!(executor.attach_listener(&listener), 1);

        let report = executor.work_on_task(5.0);

        assert_eq!(report.completed, 2);
        assert_eq!(executor.len(), 1);
        let head = executor.head().unwrap();
        assert_eq!(head.state(), TaskState::InProgress);
        assert_eq!(head.time_progress(), 1.0);
        assert_eq!(head.repeats(), 2);
        assert_eq!(log.count(TaskEvent::Complete), 2);
        assert_eq!(log.count(TaskEvent::Restart), 2);
        assert_eq!(log.count(TaskEvent::Reset), 0);
    }

    #[test]
    fn restarted_task_goes_to_back_of_queue() {
        let (mut executor, _gauge) =
            executor_with(vec![task("loop", 1.0, true), task("once", 10.0, false)]);

        let _ = executor.work_on_task(1.5);

        let names: Vec<&str> = executor.tasks().map(Task::name).collect();
        assert_eq!(names, vec!["once", "loop"]);
        assert_eq!(executor.head().unwrap().time_progress(), 0.5);
    }

    #[test]
    fn leftover_time_is_discarded_when_queue_empties() {
        let (mut executor, _gauge) = executor_with(vec![task("only", 2.0, false)]);

        let report = executor.work_on_task(5.0);

        assert!(executor.is_empty());
        assert_eq!(report.applied, 2.0);
        assert_eq!(report.discarded, 3.0);
    }

    #[test]
    fn tick_on_empty_queue_reports_zero() {
        let (mut executor, gauge) = executor_with(Vec::new());

        executor.tick(1.0);

        assert!(executor.is_empty());
        assert_eq!(executor.completions(), 0);
        assert_eq!(gauge.value(), 0.0);
        assert_eq!(gauge.updates(), 1);
    }

    #[test]
    fn only_the_head_receives_time() {
        let (mut executor, gauge) =
            executor_with(vec![task("head", 4.0, false), task("waiting", 4.0, false)]);

        executor.tick(1.0);

        let progress: Vec<f64> = executor.tasks().map(Task::time_progress).collect();
        assert_eq!(progress, vec![1.0, 0.0]);
        assert_eq!(gauge.value(), 0.25);
    }

    #[test]
    fn speed_scales_tick_time() {
        let gauge = ProgressGauge::new();
        let mut executor = TaskExecutor::from_source(
            "fast",
            2.0,
            &RepeatingTask {
                name: String::from("durdle"),
                length: 10.0,
            },
        )
        .unwrap()
        .with_progress_sink(Box::new(gauge.clone()));

        executor.tick(1.5);

        assert_eq!(executor.head().unwrap().time_progress(), 3.0);
        assert_eq!(gauge.value(), 0.3);
    }

    #[test]
    fn zero_speed_makes_no_progress() {
        let mut executor = TaskExecutor::from_source(
            "idle",
            0.0,
            &RepeatingTask {
                name: String::from("durdle"),
                length: 1.0,
            },
        )
        .unwrap();

        executor.tick(5.0);
        assert_eq!(executor.head().unwrap().state(), TaskState::Fresh);
    }

    #[test]
    fn non_positive_work_is_ignored() {
        let (mut executor, _gauge) = executor_with(vec![task("t", 2.0, false)]);

        assert_eq!(executor.work_on_task(0.0), WorkReport::default());
        assert_eq!(executor.work_on_task(-1.0), WorkReport::default());
        assert_eq!(executor.work_on_task(f64::NAN), WorkReport::default());
        assert_eq!(executor.head().unwrap().time_progress(), 0.0);
    }

    #[test]
    fn progress_is_clamped_for_the_sink() {
        let mut head = task("setback", 4.0, false);
        head.advance(-2.0);
        let (mut executor, gauge) = executor_with(vec![head]);

        executor.tick(1.0);
        assert_eq!(executor.head().unwrap().time_progress(), -1.0);
        assert_eq!(gauge.value(), 0.0);
    }

    #[test]
    fn repeating_source_rejects_bad_length() {
        let source = RepeatingTask {
            name: String::from("broken"),
            length: 0.0,
        };
        assert!(matches!(
            TaskExecutor::from_source("computer", 1.0, &source),
            Err(ExecutorError::Task { .. })
        ));
    }

    #[test]
    fn huge_speed_does_not_spin_on_a_short_repeatable_task() {
        let source = RepeatingTask {
            name: String::from("durdle"),
            length: 1.0,
        };
        let gauge = ProgressGauge::new();
        let mut executor = TaskExecutor::from_source("overclocked", 1e17, &source)
            .unwrap()
            .with_progress_sink(Box::new(gauge.clone()));

        executor.tick(0.5);

        // 5e16 - 1.0 rounds back to 5e16, so one cycle is all that can be made.
        assert_eq!(executor.completions(), 1);
        let head = executor.head().unwrap();
        assert_eq!(head.repeats(), 1);
        assert_eq!(head.time_progress(), 0.0);
        assert_eq!(gauge.updates(), 1);

        let report = executor.work_on_task(5e16);
        assert_eq!(report.completed, 1);
        assert_eq!(report.applied, 0.0);
        assert_eq!(report.discarded, 5e16);
    }

    #[test]
    fn completions_per_drain_are_capped() {
        let (mut executor, _gauge) = executor_with(vec![task("blink", 1e-6, true)]);

        let report = executor.work_on_task(0.5);

        assert_eq!(report.completed, MAX_COMPLETIONS_PER_DRAIN);
        assert!(report.discarded > 0.0);
        assert_eq!(executor.completions(), u64::from(MAX_COMPLETIONS_PER_DRAIN));
        assert_eq!(executor.head().unwrap().time_progress(), 0.0);
    }

    #[test]
    fn overshoot_from_an_already_completed_head_still_flows() {
        let mut head = task("done", 2.0, false);
        head.advance(3.0);
        let (mut executor, _gauge) = executor_with(vec![head, task("next", 5.0, false)]);

        let report = executor.work_on_task(1.0);

        assert_eq!(report.completed, 1);
        assert_eq!(report.discarded, 0.0);
        assert_eq!(executor.head().unwrap().time_progress(), 2.0);
    }

    #[test]
    fn snapshot_lists_queue_head_first() {
        let (executor, _gauge) =
            executor_with(vec![task("a", 1.0, false), task("b", 2.0, true)]);

        let snapshot = executor.snapshot();
        assert_eq!(snapshot.name, "computer");
        assert_eq!(snapshot.queue.len(), 2);
        assert_eq!(snapshot.head().map(|t| t.name.as_str()), Some("a"));
    }
}
