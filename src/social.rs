//! Capability interface of the social network side.
//!
//! The command router only ever talks to Mastodon through [`SocialAdapter`];
//! ids crossing this boundary are shorthands, never raw status ids.

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::SocialError;

/// An inbound notification from the social network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// Someone mentioned the account. `rendered` is ready for IRC.
    Mention { id: String, rendered: String },
    /// A followed account posted.
    Status { id: String, rendered: String },
    /// Someone favourited one of our toots.
    Favourite { account: String, url: String },
    /// Someone boosted one of our toots.
    Reblog { account: String, url: String },
}

impl Notification {
    /// Text announced in the IRC channel.
    pub fn to_chat_text(&self) -> String {
        match self {
            Self::Mention { rendered, .. } | Self::Status { rendered, .. } => rendered.clone(),
            Self::Favourite { account, url } => format!("{account} faved {url}"),
            Self::Reblog { account, url } => format!("{account} boosted {url}"),
        }
    }
}

/// Receives notifications as they are polled.
#[async_trait]
pub trait NotificationHandler: Send + Sync {
    async fn notify(&self, notification: Notification);
}

/// Actions the bridge can take on the social network.
#[async_trait]
pub trait SocialAdapter: Send + Sync {
    /// Post `text`; returns the new toot's id.
    async fn send(&self, text: &str) -> Result<String, SocialError>;

    /// Reply to toot `id`; returns the reply's id.
    async fn reply(&self, id: &str, text: &str) -> Result<String, SocialError>;

    /// Render toot `id` for display.
    async fn get_message(&self, id: &str) -> Result<String, SocialError>;

    /// Toggle the boost on `id`; returns whether it is now boosted.
    async fn boost(&self, id: &str) -> Result<bool, SocialError>;

    /// Toggle the favourite on `id`; returns whether it is now favourited.
    async fn favorite(&self, id: &str) -> Result<bool, SocialError>;

    /// Find a toot (usually by URL) and return its id.
    async fn search(&self, query: &str) -> Result<String, SocialError>;

    /// Delete one of our own toots.
    async fn delete(&self, id: &str) -> Result<(), SocialError>;

    /// Install the consumer of polled notifications.
    fn register_notification_handler(&self, handler: Arc<dyn NotificationHandler>);
}
