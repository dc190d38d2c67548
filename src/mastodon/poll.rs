//! Notification polling.
//!
//! Mastodon is polled rather than streamed. Besides delivering
//! notifications, the regular authenticated request keeps the token in use.

use std::sync::Arc;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::MastodonClient;
use super::api::RawNotification;
use super::render::render_toot;
use crate::error::SocialError;
use crate::social::{Notification, NotificationHandler};

/// Notification types the bridge delivers. The server is asked for these
/// only, so undismissed types cannot fill the page.
const DELIVERED_TYPES: [&str; 4] = ["mention", "status", "favourite", "reblog"];

impl MastodonClient {
    /// Fetch pending notifications once and deliver them.
    ///
    /// Delivered notifications are dismissed; unknown types are left alone.
    /// Returns the number delivered.
    pub async fn poll_once(&self) -> Result<usize, SocialError> {
        let handler = self.handler.read().clone();
        let Some(handler) = handler else {
            debug!("No notification handler registered, skipping poll");
            return Ok(0);
        };

        let query: Vec<(&str, &str)> = DELIVERED_TYPES.iter().map(|t| ("types[]", *t)).collect();
        let pending: Vec<RawNotification> = self.api.get("/api/v1/notifications", &query).await?;
        let mut delivered = 0;

        // Newest first on the wire; deliver in chronological order.
        for raw in pending.iter().rev() {
            match self.deliver(raw, &handler).await {
                Ok(true) => delivered += 1,
                Ok(false) => {
                    debug!(kind = %raw.kind, id = %raw.id, "Skipping unsupported notification");
                    continue;
                }
                Err(e) => {
                    warn!(id = %raw.id, error = %e, "Failed to deliver notification");
                    continue;
                }
            }

            let path = format!("/api/v1/notifications/{}/dismiss", raw.id);
            if let Err(e) = self
                .api
                .post::<serde_json::Value>(&path, &serde_json::json!({}))
                .await
            {
                warn!(id = %raw.id, error = %e, "Failed to dismiss notification");
            }
        }

        Ok(delivered)
    }

    /// Classify and hand over one notification. `Ok(false)` for types the
    /// bridge does not handle.
    async fn deliver(
        &self,
        raw: &RawNotification,
        handler: &Arc<dyn NotificationHandler>,
    ) -> Result<bool, SocialError> {
        let Some(status) = &raw.status else {
            return Ok(false);
        };

        let notification = match raw.kind.as_str() {
            "mention" | "status" => {
                let id = self.remember(status).await?;
                let rendered = render_toot(&id, status);
                if raw.kind == "mention" {
                    Notification::Mention { id, rendered }
                } else {
                    Notification::Status { id, rendered }
                }
            }
            "favourite" => Notification::Favourite {
                account: raw.account.name().to_string(),
                url: status.url.clone().unwrap_or_default(),
            },
            "reblog" => Notification::Reblog {
                account: raw.account.name().to_string(),
                url: status.url.clone().unwrap_or_default(),
            },
            _ => return Ok(false),
        };

        handler.notify(notification).await;
        Ok(true)
    }

    /// Poll every configured interval until cancelled.
    pub async fn run_notifications(&self, cancel: CancellationToken) {
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval = ?self.poll_interval, "Mastodon notification loop started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {}
            }
            match self.poll_once().await {
                Ok(0) => {}
                Ok(n) => debug!(delivered = n, "Delivered notifications"),
                Err(e) => warn!(error = %e, "Polling notifications failed"),
            }
        }

        info!("Mastodon notification loop stopped");
    }
}
