//! Ready-made observers for tasks and executors.
//!
//! - [`TaskEventLog`] records every task notification it receives.
//! - [`ProgressGauge`] keeps the last progress fraction an executor reported.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use durdle_types::{TaskEvent, TaskId};

use crate::executor::ProgressSink;
use crate::task::{Task, TaskListener};

/// Listener that records `(task, event)` pairs in notification order.
#[derive(Debug, Default)]
pub struct TaskEventLog {
    events: RefCell<Vec<(TaskId, TaskEvent)>>,
}

impl TaskEventLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy of every recorded event, oldest first.
    pub fn events(&self) -> Vec<(TaskId, TaskEvent)> {
        self.events.borrow().clone()
    }

    /// Return how many times `event` was recorded.
    pub fn count(&self, event: TaskEvent) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|(_, recorded)| *recorded == event)
            .count()
    }

    /// Return the number of recorded events.
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Return whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Forget every recorded event.
    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }

    fn record(&self, task: &Task, event: TaskEvent) {
        self.events.borrow_mut().push((task.id(), event));
    }
}

impl TaskListener for TaskEventLog {
    fn on_reset(&self, task: &Task) {
        self.record(task, TaskEvent::Reset);
    }

    fn on_restart(&self, task: &Task) {
        self.record(task, TaskEvent::Restart);
    }

    fn on_complete(&self, task: &Task) {
        self.record(task, TaskEvent::Complete);
    }
}

/// Progress sink whose clones share one value.
///
/// Hand one clone to an executor and keep another to read the fraction it
/// last reported.
#[derive(Debug, Clone, Default)]
pub struct ProgressGauge {
    value: Rc<Cell<f64>>,
    updates: Rc<Cell<u64>>,
}

impl ProgressGauge {
    /// Create a gauge reading 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the last reported fraction.
    pub fn value(&self) -> f64 {
        self.value.get()
    }

    /// Return how many reports the gauge has received.
    pub fn updates(&self) -> u64 {
        self.updates.get()
    }
}

impl ProgressSink for ProgressGauge {
    fn report(&mut self, fraction: f64) {
        self.value.set(fraction);
        self.updates.set(self.updates.get().saturating_add(1));
    }
}
