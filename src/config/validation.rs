//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use std::path::Path;
use thiserror::Error;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("irc.host is required")]
    MissingHost,
    #[error("irc.port must not be 0")]
    InvalidPort,
    #[error("irc.nick must be non-empty and contain no spaces, got '{0}'")]
    InvalidNick(String),
    #[error("irc.channel is required")]
    MissingChannel,
    #[error("irc.read_timeout_ms must be greater than 0")]
    ZeroReadTimeout,
    #[error("irc.queue_capacity must be greater than 0")]
    ZeroQueueCapacity,
    #[error("mastodon.base_url is required")]
    MissingBaseUrl,
    #[error("mastodon needs either access_token or username and password")]
    MissingMastodonCredentials,
    #[error("mastodon.poll_interval_secs must be greater than 0")]
    ZeroPollInterval,
    #[error("database.path parent directory does not exist: {0}")]
    DatabasePathInvalid(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();
    let irc = &config.irc;

    if irc.host.trim().is_empty() {
        errors.push(ValidationError::MissingHost);
    }
    if irc.port == 0 {
        errors.push(ValidationError::InvalidPort);
    }
    if irc.nick.is_empty() || irc.nick.contains(char::is_whitespace) {
        errors.push(ValidationError::InvalidNick(irc.nick.clone()));
    }
    // normalize_channel turns an empty name into a bare sigil
    if irc.channel.len() <= 1 {
        errors.push(ValidationError::MissingChannel);
    }
    if irc.read_timeout_ms == 0 {
        errors.push(ValidationError::ZeroReadTimeout);
    }
    if irc.queue_capacity == 0 {
        errors.push(ValidationError::ZeroQueueCapacity);
    }

    let masto = &config.mastodon;
    if masto.base_url.is_empty() {
        errors.push(ValidationError::MissingBaseUrl);
    }
    let has_token = masto.access_token.as_deref().is_some_and(|t| !t.is_empty());
    let has_login = masto.username.is_some() && masto.password.is_some();
    if !has_token && !has_login {
        errors.push(ValidationError::MissingMastodonCredentials);
    }
    if masto.poll_interval_secs == 0 {
        errors.push(ValidationError::ZeroPollInterval);
    }

    // Database path validation
    let db_path = Path::new(&config.database.path);
    if config.database.path != ":memory:"
        && let Some(parent) = db_path.parent()
        && !parent.as_os_str().is_empty()
        && !parent.exists()
    {
        errors.push(ValidationError::DatabasePathInvalid(config.database.path.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
