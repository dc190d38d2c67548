//! Connection lifecycle state machine.
//!
//! ```text
//! Disconnected -> Connecting -> Registering -> Active
//!      ^              |  ^           |           |
//!      |              +--+           |           |
//!      +-----------------------------+-----------+
//! ```
//!
//! `Connecting` may repeat while connection attempts fail. Every state may
//! fall back to `Disconnected`, which is also terminal once shutdown has
//! been requested.

use std::fmt;

/// Where the client currently is in its connection lifecycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    /// No connection; initial and terminal state.
    #[default]
    Disconnected,
    /// A connection attempt is in progress or waiting to be retried.
    Connecting,
    /// Connected; NICK/USER sent, waiting for the end of the MOTD.
    Registering,
    /// Registered and joined; normal operation.
    Active,
}

impl LifecycleState {
    /// Short lowercase name for logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Registering => "registering",
            Self::Active => "active",
        }
    }

    /// Whether moving from `self` to `next` is a legal step.
    pub fn can_transition_to(&self, next: LifecycleState) -> bool {
        use LifecycleState::*;
        matches!(
            (self, next),
            (_, Disconnected)
                | (Disconnected, Connecting)
                | (Connecting, Connecting)
                | (Connecting, Registering)
                | (Registering, Active)
                | (Active, Active)
        )
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
