//! Integration test common infrastructure.
//!
//! Provides a scripted connector that hands out in-memory streams, the
//! server end of such a stream, and helpers for assembling a client.

pub mod connector;
pub mod server;

#[allow(unused_imports)]
pub use connector::ScriptedConnector;
#[allow(unused_imports)]
pub use server::TestServer;

use std::sync::Arc;
use std::time::Duration;
use troet_bridge::irc::{Identity, LifecycleTimings, MessageStore, Session};

/// Short timings so reconnect scenarios finish quickly.
#[allow(dead_code)]
pub fn fast_timings() -> LifecycleTimings {
    LifecycleTimings {
        read_timeout: Duration::from_millis(20),
        reconnect_backoff: Duration::from_millis(10),
    }
}

/// Session for `troetbot` in `#troet`.
#[allow(dead_code)]
pub fn session(store: Arc<dyn MessageStore>) -> Arc<Session> {
    let identity = Identity {
        nick: "troetbot".to_string(),
        realname: "LetsGoTroet Bot".to_string(),
        channel: "#troet".to_string(),
        nick_password: None,
    };
    Arc::new(Session::new(identity, 64, store))
}
