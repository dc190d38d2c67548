//! Core configuration types and loading.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use super::defaults::*;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Bridge configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// IRC side: server, identity, channel.
    pub irc: IrcConfig,
    /// Mastodon side: instance and credentials.
    pub mastodon: MastodonConfig,
    /// Message store.
    #[serde(default)]
    pub database: DatabaseConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Secrets present in the process environment override the file, and the
    /// channel name is normalized.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Parse configuration from TOML text without consulting the environment.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let mut config: Config = toml::from_str(content)?;
        config.normalize();
        Ok(config)
    }

    /// Override secrets from an environment lookup.
    ///
    /// Empty values are ignored so an exported-but-blank variable does not wipe
    /// a configured secret.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get("IRC_NICKPASS") {
            self.irc.nick_password = Some(v);
        }
        if let Some(v) = get("MASTODON_ACCESS_TOKEN") {
            self.mastodon.access_token = Some(v);
        }
        if let Some(v) = get("MASTODON_CLIENT_ID") {
            self.mastodon.client_id = Some(v);
        }
        if let Some(v) = get("MASTODON_CLIENT_SECRET") {
            self.mastodon.client_secret = Some(v);
        }
        if let Some(v) = get("MASTODON_USERNAME") {
            self.mastodon.username = Some(v);
        }
        if let Some(v) = get("MASTODON_PASSWORD") {
            self.mastodon.password = Some(v);
        }
    }

    fn normalize(&mut self) {
        self.irc.channel = troet_proto::normalize_channel(&self.irc.channel);
        self.mastodon.base_url = normalize_base_url(&self.mastodon.base_url);
        if self.irc.nick_password.as_deref() == Some("") {
            self.irc.nick_password = None;
        }
    }
}

/// Add a scheme when missing and drop trailing slashes.
fn normalize_base_url(url: &str) -> String {
    let url = url.trim().trim_end_matches('/');
    if url.is_empty() || url.contains("://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// IRC connection and identity.
#[derive(Debug, Clone, Deserialize)]
pub struct IrcConfig {
    /// Server host name.
    pub host: String,
    /// Server port.
    #[serde(default = "default_irc_port")]
    pub port: u16,
    /// Connect with TLS.
    #[serde(default = "default_true")]
    pub tls: bool,
    /// Verify the server certificate. Only disable for test networks.
    #[serde(default = "default_true")]
    pub verify_cert: bool,
    /// Nickname, also used as the USER name.
    pub nick: String,
    /// Real name sent with USER.
    #[serde(default = "default_realname")]
    pub realname: String,
    /// Channel to join and relay into.
    pub channel: String,
    /// NickServ password; identification is skipped when unset.
    #[serde(default)]
    pub nick_password: Option<String>,
    /// Read deadline per loop iteration; doubles as the outbound drain interval.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Delay between failed connection attempts.
    #[serde(default = "default_reconnect_backoff_secs")]
    pub reconnect_backoff_secs: u64,
    /// Maximum number of queued outbound lines.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl IrcConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn reconnect_backoff(&self) -> Duration {
        Duration::from_secs(self.reconnect_backoff_secs)
    }
}

/// Post visibility on the Mastodon side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    #[default]
    Unlisted,
    Private,
    Direct,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Unlisted => "unlisted",
            Self::Private => "private",
            Self::Direct => "direct",
        }
    }
}

/// Mastodon instance and credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct MastodonConfig {
    /// Instance URL, e.g. `https://chaos.social`.
    pub base_url: String,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Bearer token. When absent a token is requested with the password grant.
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Notification polling interval.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Visibility of posted toots.
    #[serde(default)]
    pub visibility: Visibility,
}

impl MastodonConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// SQLite file path, or `:memory:`.
    #[serde(default = "default_database_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
        }
    }
}
