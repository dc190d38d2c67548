//! Application wiring.
//!
//! Connects the two sides: classified IRC messages go to the
//! [`CommandRouter`], Mastodon notifications are announced in the channel.

use async_trait::async_trait;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::irc::{Connector, IrcClient, IrcHandle};
use crate::mastodon::MastodonClient;
use crate::router::{ChatSink, CommandRouter};
use crate::social::{Notification, NotificationHandler, SocialAdapter};

/// Announces notifications in the bridged channel.
pub struct NotificationRelay {
    irc: IrcHandle,
}

impl NotificationRelay {
    pub fn new(irc: IrcHandle) -> Self {
        Self { irc }
    }
}

#[async_trait]
impl NotificationHandler for NotificationRelay {
    async fn notify(&self, notification: Notification) {
        if let Err(e) = self.irc.send(&notification.to_chat_text()).await {
            error!(error = %e, "Failed to record relayed notification");
        }
    }
}

/// The running bridge.
pub struct App<C: Connector> {
    irc: IrcClient<C>,
    mastodon: Arc<MastodonClient>,
}

impl<C: Connector> App<C> {
    /// Wire router and relay between the two clients.
    pub fn new(irc: IrcClient<C>, mastodon: Arc<MastodonClient>) -> Self {
        let handle = IrcHandle::new(irc.session().clone());
        let social: Arc<dyn SocialAdapter> = mastodon.clone();
        let router = CommandRouter::new(Arc::new(handle.clone()), social);
        handle.register_handler(Arc::new(router));
        mastodon.register_notification_handler(Arc::new(NotificationRelay::new(handle)));

        Self { irc, mastodon }
    }

    /// Run both sides until `cancel` fires.
    pub async fn run(self, cancel: CancellationToken) {
        let poller = tokio::spawn({
            let mastodon = Arc::clone(&self.mastodon);
            let cancel = cancel.clone();
            async move { mastodon.run_notifications(cancel).await }
        });

        info!(channel = %self.irc.session().channel(), "Bridge running");
        self.irc.run(cancel.clone()).await;

        // The IRC loop only returns on cancellation; make sure the poller follows.
        cancel.cancel();
        if let Err(e) = poller.await {
            warn!(error = %e, "Notification task ended abnormally");
        }
        info!("Bridge stopped");
    }
}
