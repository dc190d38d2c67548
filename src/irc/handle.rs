//! Sending side of the IRC client.
//!
//! Nothing here touches the network: text is split into protocol lines and
//! queued for the lifecycle's next drain. Every queued line is also stored so
//! it can be referenced later.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::error;
use troet_proto::{is_channel, split_text};

use super::inbound::InboundHandler;
use super::session::Session;
use crate::error::StoreError;
use crate::router::ChatSink;

/// Cloneable handle for talking to IRC from other tasks.
#[derive(Clone)]
pub struct IrcHandle {
    session: Arc<Session>,
}

impl IrcHandle {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Install the consumer of classified inbound messages.
    pub fn register_handler(&self, handler: Arc<dyn InboundHandler>) {
        self.session.set_inbound_handler(handler);
    }

    /// Queue `text` for `target`: NOTICE for channels, PRIVMSG for nicks.
    ///
    /// Returns the stored id of every line. Lines are queued even if storing
    /// them fails; the first store error is returned after all lines are queued.
    pub async fn send_to(&self, target: &str, text: &str) -> Result<Vec<String>, StoreError> {
        let command = if is_channel(target) { "NOTICE" } else { "PRIVMSG" };
        let me = self.session.current_nick();
        let mut ids = Vec::new();
        let mut first_err = None;

        for msg in split_text(command, target, text) {
            let line = msg.trailing.clone().unwrap_or_default();
            self.session.outbox().push_text(msg.to_string());
            match self.session.store().store(&me, target, &line).await {
                Ok(id) => ids.push(id),
                Err(e) => {
                    error!(error = %e, recipient = %target, "Failed to store outbound message");
                    first_err.get_or_insert(e);
                }
            }
        }

        match first_err {
            Some(e) => Err(e),
            None => Ok(ids),
        }
    }

    /// Text of a reply to a message from `sender` that was sent to `target`.
    ///
    /// `%s` is replaced by the sender's nick; otherwise channel replies are
    /// addressed with a `nick: ` prefix.
    pub fn reply_text(sender: &str, target: &str, text: &str) -> String {
        if text.contains("%s") {
            text.replacen("%s", sender, 1)
        } else {
            Self::addressed(sender, target, text)
        }
    }

    /// `text` addressed to `sender`, without template substitution.
    pub fn addressed(sender: &str, target: &str, text: &str) -> String {
        if is_channel(target) {
            format!("{sender}: {text}")
        } else {
            text.to_string()
        }
    }

    async fn reply_with(
        &self,
        id: &str,
        text: &str,
        compose: fn(&str, &str, &str) -> String,
    ) -> Result<(), StoreError> {
        let origin = self.session.store().lookup(id).await?;
        let text = compose(&origin.sender, &origin.target, text);
        let destination = if is_channel(&origin.target) {
            origin.target
        } else {
            origin.sender
        };
        self.send_to(&destination, &text).await.map(|_| ())
    }
}

#[async_trait]
impl ChatSink for IrcHandle {
    async fn send(&self, text: &str) -> Result<(), StoreError> {
        let channel = self.session.channel().to_string();
        self.send_to(&channel, text).await.map(|_| ())
    }

    async fn reply(&self, id: &str, text: &str) -> Result<(), StoreError> {
        self.reply_with(id, text, Self::reply_text).await
    }

    async fn reply_verbatim(&self, id: &str, text: &str) -> Result<(), StoreError> {
        self.reply_with(id, text, Self::addressed).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::irc::session::test_support::*;
    use crate::irc::store::MessageStore;
    use troet_proto::MAX_LINE_LEN;

    #[tokio::test]
    async fn test_channel_send_uses_notice_and_stores() {
        let store = Arc::new(MemoryStore::default());
        let handle = IrcHandle::new(session_with(store.clone(), None));

        handle.send("one\ntwo").await.unwrap();
        assert_eq!(
            drain(handle.session()),
            vec!["NOTICE #troet :one", "NOTICE #troet :two"]
        );
        let rows = store.rows.lock();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], ("troetbot".into(), "#troet".into(), "one".into()));
    }

    #[tokio::test]
    async fn test_long_text_is_split_within_limit() {
        let store = Arc::new(MemoryStore::default());
        let handle = IrcHandle::new(session_with(store.clone(), None));
        let text = "ä".repeat(600);

        let ids = handle.send_to("alice", &text).await.unwrap();
        let lines = drain(handle.session());
        assert_eq!(ids.len(), lines.len());
        assert!(lines.len() > 1);

        let mut rebuilt = String::new();
        for line in &lines {
            assert!(line.len() + 2 <= MAX_LINE_LEN);
            let body = line.strip_prefix("PRIVMSG alice :").unwrap();
            rebuilt.push_str(body);
        }
        assert_eq!(rebuilt, text);
    }

    #[tokio::test]
    async fn test_reply_in_channel_prefixes_sender() {
        let store = Arc::new(MemoryStore::default());
        let handle = IrcHandle::new(session_with(store.clone(), None));
        let id = store.store("alice", "#troet", ".t hi").await.unwrap();

        handle.reply(&id, "[AbC] Toot successful").await.unwrap();
        assert_eq!(
            drain(handle.session()),
            vec!["NOTICE #troet :alice: [AbC] Toot successful"]
        );
    }

    #[tokio::test]
    async fn test_direct_reply_goes_to_sender() {
        let store = Arc::new(MemoryStore::default());
        let handle = IrcHandle::new(session_with(store.clone(), None));
        let id = store.store("bob", "troetbot", "help?").await.unwrap();

        handle.reply(&id, "Hi %s, try .?").await.unwrap();
        assert_eq!(drain(handle.session()), vec!["PRIVMSG bob :Hi bob, try .?"]);
    }

    #[tokio::test]
    async fn test_verbatim_reply_keeps_placeholder() {
        let store = Arc::new(MemoryStore::default());
        let handle = IrcHandle::new(session_with(store.clone(), None));
        let id = store.store("alice", "#troet", ".t hi").await.unwrap();

        handle
            .reply_verbatim(&id, "Error during sending: 100%s broken")
            .await
            .unwrap();
        assert_eq!(
            drain(handle.session()),
            vec!["NOTICE #troet :alice: Error during sending: 100%s broken"]
        );
    }

    #[tokio::test]
    async fn test_reply_to_unknown_id() {
        let handle = IrcHandle::new(session_with(Arc::default(), None));
        assert!(matches!(
            handle.reply("42", "x").await,
            Err(StoreError::NotFound(_))
        ));
        assert!(handle.session().outbox().is_empty());
    }
}
