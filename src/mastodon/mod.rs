//! Mastodon adapter.
//!
//! Implements [`SocialAdapter`] on top of the Mastodon REST API. Toots are
//! addressed from IRC by shorthand; the `messages_mastodon` table maps each
//! shorthand to its status id.

mod api;
mod auth;
mod poll;
mod render;
pub mod shorthand;

pub use api::{Account, ApiError, Status};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::config::{MastodonConfig, Visibility};
use crate::db::{Database, DbError};
use crate::error::SocialError;
use crate::social::{NotificationHandler, SocialAdapter};
use api::Api;
use render::render_toot;

/// Salted attempts before giving up on finding a free shorthand.
const MAX_SHORTHAND_ATTEMPTS: u32 = 16;

/// Connected Mastodon account.
pub struct MastodonClient {
    api: Api,
    db: Database,
    account: Account,
    visibility: Visibility,
    poll_interval: Duration,
    handler: RwLock<Option<Arc<dyn NotificationHandler>>>,
}

impl MastodonClient {
    /// Authenticate and verify the account.
    ///
    /// Uses the configured access token, or obtains one via the password
    /// grant when none is configured.
    pub async fn connect(config: &MastodonConfig, db: Database) -> Result<Self, SocialError> {
        let mut api = Api::new(&config.base_url)?;
        let token = match config.access_token.as_deref() {
            Some(token) if !token.is_empty() => token.to_string(),
            _ => {
                info!("No access token configured, logging in with user credentials");
                auth::obtain_token(&api, config).await?
            }
        };
        api.set_token(token);

        let account: Account = api.get("/api/v1/accounts/verify_credentials", &[]).await?;
        info!(
            instance = %api.base_url(),
            account = %account.acct,
            "Mastodon account verified"
        );

        Ok(Self {
            api,
            db,
            account,
            visibility: config.visibility,
            poll_interval: config.poll_interval(),
            handler: RwLock::new(None),
        })
    }

    /// Shorthand for `status`, remembering it on first sight.
    async fn remember(&self, status: &Status) -> Result<String, SocialError> {
        let toots = self.db.toots();
        if let Some(record) = toots.find_by_toot_id(&status.id).await? {
            return Ok(record.shorthand);
        }

        for attempt in 0..MAX_SHORTHAND_ATTEMPTS {
            let shorthand = shorthand::encode(&status.id, attempt);
            let rendered = render_toot(&shorthand, status);
            match toots.insert(&shorthand, &status.id, &rendered).await {
                Ok(()) => return Ok(shorthand),
                Err(DbError::ShorthandTaken(_)) => {
                    // Raced with another insert of the same toot.
                    if let Some(record) = toots.find_by_toot_id(&status.id).await? {
                        return Ok(record.shorthand);
                    }
                    debug!(shorthand = %shorthand, attempt, "Shorthand collision, salting");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(SocialError::Remote(format!(
            "no free shorthand for toot {}",
            status.id
        )))
    }

    /// Resolve a shorthand to the current state of its toot.
    ///
    /// A toot that is gone remotely is forgotten locally as well.
    async fn lookup(&self, shorthand: &str) -> Result<Status, SocialError> {
        let toots = self.db.toots();
        let Some(record) = toots.find_by_shorthand(shorthand).await? else {
            return Err(SocialError::NotFound(shorthand.to_string()));
        };

        match self
            .api
            .get::<Status>(&format!("/api/v1/statuses/{}", record.toot_id), &[])
            .await
        {
            Ok(status) => Ok(status),
            Err(ApiError::NotFound) => {
                toots.delete(shorthand).await?;
                info!(shorthand = %shorthand, toot = %record.toot_id, "Toot vanished, forgot shorthand");
                Err(SocialError::NotFound(shorthand.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn post_status(&self, text: &str, in_reply_to: Option<&str>) -> Result<Status, SocialError> {
        let mut body = json!({
            "status": text,
            "visibility": self.visibility.as_str(),
        });
        if let Some(id) = in_reply_to {
            body["in_reply_to_id"] = json!(id);
        }
        Ok(self.api.post("/api/v1/statuses", &body).await?)
    }
}

#[async_trait]
impl SocialAdapter for MastodonClient {
    async fn send(&self, text: &str) -> Result<String, SocialError> {
        let status = self.post_status(text, None).await?;
        self.remember(&status).await
    }

    async fn reply(&self, id: &str, text: &str) -> Result<String, SocialError> {
        let parent = self.lookup(id).await?;
        let status = self.post_status(text, Some(&parent.id)).await?;
        self.remember(&status).await
    }

    async fn get_message(&self, id: &str) -> Result<String, SocialError> {
        let status = self.lookup(id).await?;
        let rendered = render_toot(id, &status);
        self.db.toots().update_content(id, &rendered).await?;
        Ok(rendered)
    }

    async fn boost(&self, id: &str) -> Result<bool, SocialError> {
        let status = self.lookup(id).await?;
        let (action, body) = if status.reblogged {
            ("unreblog", json!({}))
        } else {
            ("reblog", json!({"visibility": "public"}))
        };
        self.api
            .post::<serde_json::Value>(&format!("/api/v1/statuses/{}/{action}", status.id), &body)
            .await?;
        Ok(!status.reblogged)
    }

    async fn favorite(&self, id: &str) -> Result<bool, SocialError> {
        let status = self.lookup(id).await?;
        let action = if status.favourited { "unfavourite" } else { "favourite" };
        self.api
            .post::<serde_json::Value>(&format!("/api/v1/statuses/{}/{action}", status.id), &json!({}))
            .await?;
        Ok(!status.favourited)
    }

    async fn search(&self, query: &str) -> Result<String, SocialError> {
        let results: api::SearchResults = self
            .api
            .get(
                "/api/v2/search",
                &[("q", query), ("resolve", "true"), ("type", "statuses")],
            )
            .await?;
        let status = results.statuses.first().ok_or(SocialError::NoResults)?;
        self.remember(status).await
    }

    async fn delete(&self, id: &str) -> Result<(), SocialError> {
        let status = self.lookup(id).await?;
        if status.account.id != self.account.id {
            return Err(SocialError::Forbidden(format!(
                "{id} is not our toot but belongs to {}",
                status.account.acct
            )));
        }
        self.api.delete(&format!("/api/v1/statuses/{}", status.id)).await?;
        self.db.toots().delete(id).await?;
        info!(shorthand = %id, toot = %status.id, "Deleted toot");
        Ok(())
    }

    fn register_notification_handler(&self, handler: Arc<dyn NotificationHandler>) {
        *self.handler.write() = Some(handler);
    }
}
