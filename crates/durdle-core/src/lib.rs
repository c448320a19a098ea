//! Tick scheduling, task state, and task executors for the Durdle simulation.
//!
//! Simulation time is decoupled from the frame rate. Frames report elapsed
//! time to a [`TickScheduler`], which emits fixed-duration ticks to its
//! subscribers. A [`TaskExecutor`] receiving a tick drains that time into
//! its queue of [`Task`]s, carrying excess progress from one completed task
//! into the next.
//!
//! # Modules
//!
//! - [`clock`] -- [`TickScheduler`] and the [`TickReceiver`] capability.
//! - [`config`] -- Configuration loading from `durdle-config.yaml` into
//!   strongly-typed structs.
//! - [`executor`] -- [`TaskExecutor`], [`TaskSource`] seeding strategies,
//!   and the [`ProgressSink`] capability.
//! - [`listener`] -- Ready-made task listeners and progress sinks.
//! - [`runner`] -- Real-time frame loop with run bounds and shutdown.
//! - [`task`] -- [`Task`] state machine and the [`TaskListener`] capability.
//!
//! [`TickScheduler`]: clock::TickScheduler
//! [`TickReceiver`]: clock::TickReceiver
//! [`TaskExecutor`]: executor::TaskExecutor
//! [`TaskSource`]: executor::TaskSource
//! [`ProgressSink`]: executor::ProgressSink
//! [`Task`]: task::Task
//! [`TaskListener`]: task::TaskListener

pub mod clock;
pub mod config;
pub mod executor;
pub mod listener;
pub mod runner;
pub mod task;
