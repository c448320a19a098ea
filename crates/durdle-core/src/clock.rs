//! Fixed-rate tick scheduler for the Durdle simulation.
//!
//! The scheduler decouples simulation time from the rendering frame rate.
//! Each frame reports the current time; the scheduler converts the time
//! elapsed since its last emission into whole ticks and fans a single tick
//! event out to every subscriber.
//!
//! # Design Principles
//!
//! - Bookkeeping is integer-exact: the last emission time only ever moves
//!   by whole multiples of the tick duration, and the sub-tick remainder
//!   stays pending for the next frame.
//! - Several whole ticks that accumulated between frames are delivered as
//!   one event carrying their summed duration. Receivers see total elapsed
//!   time, not individual tick boundaries.
//! - A timestamp earlier than the last emission (clock rollback) emits
//!   nothing. The scheduler never fails once constructed.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use durdle_types::SubscriptionId;
use tracing::{debug, trace, warn};

use crate::config::ClockConfig;

/// Errors that can occur when constructing a scheduler.
#[derive(Debug, thiserror::Error)]
pub enum ClockError {
    /// Invalid clock configuration (e.g. zero ticks per second).
    #[error("invalid clock configuration: {reason}")]
    InvalidConfig {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

/// Anything that can accept tick events from the [`TickScheduler`].
///
/// `elapsed` is the simulated time covered by the event, in seconds. It is
/// always positive and always an exact multiple of the scheduler's tick
/// duration, but receivers must not assume it covers exactly one tick.
pub trait TickReceiver {
    /// Consume `elapsed` seconds of simulated time.
    fn tick(&mut self, elapsed: f64);
}

/// A receiver shared between the scheduler and whoever else owns it.
pub type SharedReceiver = Rc<RefCell<dyn TickReceiver>>;

/// What a single [`TickScheduler::on_frame`] call emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickEmission {
    /// Number of whole ticks folded into the event.
    pub ticks: u64,
    /// Simulated time delivered to subscribers (`ticks * tick_duration`).
    pub elapsed: Duration,
}

/// A registered receiver and the handle that identifies it.
struct Subscriber {
    id: SubscriptionId,
    receiver: SharedReceiver,
}

/// Accumulates frame time and emits fixed-duration ticks to subscribers.
///
/// Subscribers are notified synchronously, in subscription order. The same
/// receiver may be subscribed more than once, in which case it receives
/// every tick once per subscription.
pub struct TickScheduler {
    /// Duration of one logical tick.
    tick_duration: Duration,

    /// Receivers in delivery order.
    subscribers: Vec<Subscriber>,

    /// Time of the last emission, always a whole number of ticks.
    last_emit: Duration,

    /// Number of ticks emitted since construction.
    total_ticks: u64,
}

impl TickScheduler {
    /// Create a scheduler from a clock configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if the tick rate is invalid.
    pub fn new(config: &ClockConfig) -> Result<Self, ClockError> {
        Self::with_rate(config.ticks_per_second)
    }

    /// Create a scheduler emitting `ticks_per_second` logical ticks per
    /// second of frame time. The origin (last emission time) is zero.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::InvalidConfig`] if `ticks_per_second` is 0 or
    /// so large that one tick would be shorter than a nanosecond.
    pub fn with_rate(ticks_per_second: u32) -> Result<Self, ClockError> {
        if ticks_per_second == 0 {
            return Err(ClockError::InvalidConfig {
                reason: "ticks_per_second must be at least 1".to_owned(),
            });
        }

        let tick_duration = Duration::from_secs(1)
            .checked_div(ticks_per_second)
            .filter(|duration| !duration.is_zero())
            .ok_or_else(|| ClockError::InvalidConfig {
                reason: format!("ticks_per_second {ticks_per_second} exceeds nanosecond resolution"),
            })?;

        Ok(Self {
            tick_duration,
            subscribers: Vec::new(),
            last_emit: Duration::ZERO,
            total_ticks: 0,
        })
    }

    /// Subscribe a receiver to tick events.
    ///
    /// Returns a handle that can be passed to [`unsubscribe`](Self::unsubscribe).
    /// Subscriptions are not deduplicated.
    pub fn subscribe(&mut self, receiver: SharedReceiver) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.subscribers.push(Subscriber { id, receiver });
        debug!(subscription = %id, subscribers = self.subscribers.len(), "Receiver subscribed");
        id
    }

    /// Cancel a subscription. Returns `false` if the handle is unknown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|subscriber| subscriber.id != id);
        let removed = self.subscribers.len() != before;
        if removed {
            debug!(subscription = %id, "Receiver unsubscribed");
        }
        removed
    }

    /// Report the current frame time.
    ///
    /// `now` is measured from the same origin as previous calls and should
    /// never decrease. If at least one whole tick has elapsed since the last
    /// emission, every subscriber receives one event covering all of them
    /// and the emission is returned. Otherwise nothing happens.
    pub fn on_frame(&mut self, now: Duration) -> Option<TickEmission> {
        let Some(delta) = now.checked_sub(self.last_emit) else {
            debug!(
                now_ms = now.as_millis(),
                last_emit_ms = self.last_emit.as_millis(),
                "Frame time went backwards, no tick emitted"
            );
            return None;
        };

        if delta < self.tick_duration {
            return None;
        }

        let tick_nanos = self.tick_duration.as_nanos();
        let delta_nanos = delta.as_nanos();
        let ticks = delta_nanos.checked_div(tick_nanos)?;
        // The remainder is below one tick (at most one second), so it fits u64.
        let remainder_nanos = u64::try_from(delta_nanos.checked_rem(tick_nanos)?).ok()?;
        let consumed = delta.checked_sub(Duration::from_nanos(remainder_nanos))?;
        let ticks = u64::try_from(ticks).unwrap_or(u64::MAX);

        self.emit(consumed.as_secs_f64());

        self.last_emit = self.last_emit.checked_add(consumed)?;
        self.total_ticks = self.total_ticks.saturating_add(ticks);

        trace!(
            ticks,
            elapsed_ms = consumed.as_millis(),
            total_ticks = self.total_ticks,
            "Ticks emitted"
        );

        Some(TickEmission {
            ticks,
            elapsed: consumed,
        })
    }

    /// Deliver one tick event to every subscriber, in subscription order.
    fn emit(&self, elapsed: f64) {
        for subscriber in &self.subscribers {
            if let Ok(mut receiver) = subscriber.receiver.try_borrow_mut() {
                receiver.tick(elapsed);
            } else {
                warn!(
                    subscription = %subscriber.id,
                    elapsed,
                    "Receiver already borrowed, tick skipped"
                );
            }
        }
    }

    /// Return the duration of one logical tick.
    pub const fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    /// Return the time of the last emission.
    pub const fn last_emit(&self) -> Duration {
        self.last_emit
    }

    /// Return the number of ticks emitted since construction.
    pub const fn total_ticks(&self) -> u64 {
        self.total_ticks
    }

    /// Return the number of active subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl core::fmt::Debug for TickScheduler {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TickScheduler")
            .field("tick_duration", &self.tick_duration)
            .field("subscribers", &self.subscribers.len())
            .field("last_emit", &self.last_emit)
            .field("total_ticks", &self.total_ticks)
            .finish()
    }
}
