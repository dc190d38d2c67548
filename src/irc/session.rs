//! Shared state of the IRC client.
//!
//! A [`Session`] outlives individual connections. Dispatch handlers, the
//! lifecycle loop and [`IrcHandle`](super::IrcHandle) all hold an
//! `Arc<Session>`; each field carries its own synchronization so no handler
//! ever needs the connection itself.

use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use troet_proto::{LifecycleState, Message};

use super::inbound::InboundHandler;
use super::operators::OperatorTracker;
use super::queue::Outbox;
use super::store::MessageStore;

/// Static identity of the client.
#[derive(Debug, Clone)]
pub struct Identity {
    pub nick: String,
    pub realname: String,
    /// Normalized channel name, sigil included.
    pub channel: String,
    pub nick_password: Option<String>,
}

/// State shared between the lifecycle loop and everything that talks to it.
pub struct Session {
    identity: Identity,
    current_nick: RwLock<String>,
    outbox: Outbox,
    operators: OperatorTracker,
    store: Arc<dyn MessageStore>,
    inbound: RwLock<Option<Arc<dyn InboundHandler>>>,
    state: Mutex<LifecycleState>,
    state_tx: broadcast::Sender<LifecycleState>,
}

impl Session {
    pub fn new(identity: Identity, queue_capacity: usize, store: Arc<dyn MessageStore>) -> Self {
        let (state_tx, _) = broadcast::channel(16);
        Self {
            current_nick: RwLock::new(identity.nick.clone()),
            identity,
            outbox: Outbox::new(queue_capacity),
            operators: OperatorTracker::new(),
            store,
            inbound: RwLock::new(None),
            state: Mutex::new(LifecycleState::Disconnected),
            state_tx,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The configured channel.
    pub fn channel(&self) -> &str {
        &self.identity.channel
    }

    /// The nick the server currently knows us by.
    pub fn current_nick(&self) -> String {
        self.current_nick.read().clone()
    }

    pub fn set_current_nick(&self, nick: &str) {
        *self.current_nick.write() = nick.to_string();
    }

    /// Go back to the configured nick for a fresh registration.
    pub fn reset_nick(&self) {
        self.set_current_nick(&self.identity.nick);
    }

    pub fn outbox(&self) -> &Outbox {
        &self.outbox
    }

    /// Queue a protocol control message for the next drain.
    pub fn enqueue(&self, msg: Message) {
        self.outbox.push_control(msg.to_string());
    }

    pub fn operators(&self) -> &OperatorTracker {
        &self.operators
    }

    pub fn store(&self) -> &Arc<dyn MessageStore> {
        &self.store
    }

    /// Install the consumer of classified inbound messages, replacing any
    /// previous one.
    pub fn set_inbound_handler(&self, handler: Arc<dyn InboundHandler>) {
        *self.inbound.write() = Some(handler);
    }

    pub fn inbound_handler(&self) -> Option<Arc<dyn InboundHandler>> {
        self.inbound.read().clone()
    }

    pub fn state(&self) -> LifecycleState {
        *self.state.lock()
    }

    /// Watch lifecycle state changes.
    pub fn subscribe(&self) -> broadcast::Receiver<LifecycleState> {
        self.state_tx.subscribe()
    }

    /// Move to `next` if that is a legal step.
    ///
    /// Staying in the same state is accepted but not broadcast. Returns
    /// `false` and leaves the state alone for an illegal step.
    pub fn set_state(&self, next: LifecycleState) -> bool {
        let mut state = self.state.lock();
        let prev = *state;
        if !prev.can_transition_to(next) {
            warn!(from = %prev, to = %next, "Ignoring illegal lifecycle transition");
            return false;
        }
        *state = next;
        drop(state);

        if prev != next {
            debug!(from = %prev, to = %next, "Lifecycle transition");
            // no receivers is fine
            let _ = self.state_tx.send(next);
        }
        true
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::error::StoreError;
    use crate::irc::store::StoredRef;
    use async_trait::async_trait;

    /// In-memory store for unit tests.
    #[derive(Default)]
    pub struct MemoryStore {
        pub rows: Mutex<Vec<(String, String, String)>>,
    }

    #[async_trait]
    impl MessageStore for MemoryStore {
        async fn store(&self, sender: &str, target: &str, text: &str) -> Result<String, StoreError> {
            let mut rows = self.rows.lock();
            rows.push((sender.to_string(), target.to_string(), text.to_string()));
            Ok(rows.len().to_string())
        }

        async fn lookup(&self, id: &str) -> Result<StoredRef, StoreError> {
            let index: usize = id.parse().map_err(|_| StoreError::NotFound(id.to_string()))?;
            let rows = self.rows.lock();
            rows.get(index.wrapping_sub(1))
                .map(|(sender, target, _)| StoredRef {
                    sender: sender.clone(),
                    target: target.clone(),
                })
                .ok_or_else(|| StoreError::NotFound(id.to_string()))
        }
    }

    pub fn session_with(store: Arc<MemoryStore>, nick_password: Option<&str>) -> Arc<Session> {
        Arc::new(Session::new(
            Identity {
                nick: "troetbot".to_string(),
                realname: "LetsGoTroet Bot".to_string(),
                channel: "#troet".to_string(),
                nick_password: nick_password.map(str::to_string),
            },
            16,
            store,
        ))
    }

    pub fn drain(session: &Session) -> Vec<String> {
        std::iter::from_fn(|| session.outbox().pop(true))
            .map(|(_, line)| line)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_state_transitions_are_broadcast_once() {
        let session = session_with(Arc::default(), None);
        let mut rx = session.subscribe();

        assert!(session.set_state(LifecycleState::Connecting));
        assert!(session.set_state(LifecycleState::Connecting));
        assert!(session.set_state(LifecycleState::Registering));
        assert!(session.set_state(LifecycleState::Active));
        assert!(session.set_state(LifecycleState::Active));

        assert_eq!(rx.try_recv().unwrap(), LifecycleState::Connecting);
        assert_eq!(rx.try_recv().unwrap(), LifecycleState::Registering);
        assert_eq!(rx.try_recv().unwrap(), LifecycleState::Active);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_illegal_transition_rejected() {
        let session = session_with(Arc::default(), None);
        assert!(!session.set_state(LifecycleState::Active));
        assert_eq!(session.state(), LifecycleState::Disconnected);
    }

    #[test]
    fn test_nick_reset() {
        let session = session_with(Arc::default(), None);
        session.set_current_nick("troetbot_");
        assert_eq!(session.current_nick(), "troetbot_");
        session.reset_nick();
        assert_eq!(session.current_nick(), "troetbot");
    }
}
