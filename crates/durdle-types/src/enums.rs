//! Enumeration types for the Durdle simulation.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Task lifecycle
// ---------------------------------------------------------------------------

/// Observable lifecycle state of a task.
///
/// ```text
///   Fresh --advance--> InProgress --threshold--> Completed
///                          ^                         |
///                          +-------- restart --------+   (repeatable only)
/// ```
///
/// `reset` returns a task in any state to `Fresh`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaskState {
    /// No progress has been applied since creation (or the last reset/restart).
    Fresh,
    /// Progress has been applied but the completion threshold was not reached.
    InProgress,
    /// The completion threshold was reached. Terminal for non-repeatable tasks.
    Completed,
}

/// A notification delivered to task listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TaskEvent {
    /// The task was reset to its initial values.
    Reset,
    /// A repeatable task was restarted for a new cycle.
    Restart,
    /// The task reached its completion threshold.
    Complete,
}

impl core::fmt::Display for TaskState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::Fresh => "fresh",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        };
        f.write_str(label)
    }
}

impl core::fmt::Display for TaskEvent {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let label = match self {
            Self::Reset => "reset",
            Self::Restart => "restart",
            Self::Complete => "complete",
        };
        f.write_str(label)
    }
}
