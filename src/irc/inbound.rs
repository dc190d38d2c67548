//! Classified inbound messages and the hook that consumes them.

use async_trait::async_trait;

/// How an inbound PRIVMSG reached us.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// In the configured channel, from a known channel operator.
    ChannelOperator,
    /// In the configured channel, from anyone else.
    ChannelUser,
    /// Addressed to our nick.
    Direct,
}

/// A stored, classified inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub kind: MessageKind,
    pub sender: String,
    /// Channel name, or our nick for direct messages.
    pub target: String,
    pub text: String,
    /// Id assigned by the message store.
    pub id: String,
}

/// Receives every classified inbound message.
#[async_trait]
pub trait InboundHandler: Send + Sync {
    async fn handle(&self, msg: InboundMessage);
}
