//! Shared type definitions for the Durdle simulation.
//!
//! This crate holds the vocabulary shared by the simulation core and the
//! engine binary: identifiers, lifecycle enums, and serializable snapshots.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers for tasks, executors, and handles
//! - [`enums`] -- Task lifecycle state and listener notification kinds
//! - [`structs`] -- Serializable task and executor snapshots

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{TaskEvent, TaskState};
pub use ids::{ExecutorId, ListenerId, SubscriptionId, TaskId};
pub use structs::{ExecutorSnapshot, TaskSnapshot};
