//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Tasks, executors, listener registrations, and scheduler subscriptions
//! each get their own ID type so they cannot be mixed up at compile time.
//! All IDs use UUID v7 (time-ordered), so IDs minted later sort later.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a task.
    TaskId
}

define_id! {
    /// Unique identifier for a task executor (a "computer" working a queue).
    ExecutorId
}

define_id! {
    /// Handle returned when a listener is registered on a task. Pass it back
    /// to remove that registration.
    ListenerId
}

define_id! {
    /// Handle returned when a receiver subscribes to the tick scheduler.
    /// Pass it back to cancel the subscription.
    SubscriptionId
}
