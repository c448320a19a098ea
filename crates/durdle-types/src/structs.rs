//! Point-in-time snapshots of simulation entities.
//!
//! Snapshots are plain data: they are produced by the live objects in
//! `durdle-core` for logging and inspection and never feed back into the
//! simulation.

use serde::{Deserialize, Serialize};

use crate::enums::TaskState;
use crate::ids::{ExecutorId, TaskId};

/// Snapshot of a single task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSnapshot {
    /// The task's identifier.
    pub id: TaskId,
    /// Human-readable task name.
    pub name: String,
    /// Lifecycle state at the time of the snapshot.
    pub state: TaskState,
    /// Progress (in seconds) required to complete the task.
    pub complete_time: f64,
    /// Cumulative progress (in seconds) applied so far.
    pub time_progress: f64,
    /// Whether the task may be restarted after completion.
    pub repeatable: bool,
    /// Number of completed cycles since the last reset.
    pub repeats: u32,
}

/// Snapshot of a task executor and its queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorSnapshot {
    /// The executor's identifier.
    pub id: ExecutorId,
    /// Human-readable executor name.
    pub name: String,
    /// Throughput multiplier applied to every tick.
    pub speed: f64,
    /// Queued tasks, head first.
    pub queue: Vec<TaskSnapshot>,
    /// Total number of task completions observed by this executor.
    pub completions: u64,
}

impl ExecutorSnapshot {
    /// Return the snapshot of the task at the head of the queue, if any.
    pub fn head(&self) -> Option<&TaskSnapshot> {
        self.queue.first()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn make_task(name: &str) -> TaskSnapshot {
        TaskSnapshot {
            id: TaskId::new(),
            name: name.to_owned(),
            state: TaskState::Fresh,
            complete_time: 10.0,
            time_progress: 0.0,
            repeatable: true,
            repeats: 0,
        }
    }

    #[test]
    fn executor_snapshot_serializes_queue_in_order() {
        let snapshot = ExecutorSnapshot {
            id: ExecutorId::new(),
            name: String::from("computer"),
            speed: 1.0,
            queue: vec![make_task("first"), make_task("second")],
            completions: 3,
        };

        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["name"], "computer");
        assert_eq!(value["queue"][0]["name"], "first");
        assert_eq!(value["queue"][1]["name"], "second");
        assert_eq!(value["completions"], 3);
    }

    #[test]
    fn head_of_empty_queue_is_none() {
        let snapshot = ExecutorSnapshot {
            id: ExecutorId::new(),
            name: String::from("idle"),
            speed: 1.0,
            queue: Vec::new(),
            completions: 0,
        };
        assert!(snapshot.head().is_none());
    }
}
