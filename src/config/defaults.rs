//! Default value functions for configuration.
//!
//! Separated into its own module for clarity and reuse.

/// Returns `true` (for serde defaults).
pub fn default_true() -> bool {
    true
}

// =============================================================================
// IRC Defaults
// =============================================================================

pub fn default_irc_port() -> u16 {
    6697
}

pub fn default_realname() -> String {
    "LetsGoTroet Bot".to_string()
}

pub fn default_read_timeout_ms() -> u64 {
    1000
}

pub fn default_reconnect_backoff_secs() -> u64 {
    10
}

pub fn default_queue_capacity() -> usize {
    64
}

// =============================================================================
// Mastodon Defaults
// =============================================================================

pub fn default_poll_interval_secs() -> u64 {
    15
}

// =============================================================================
// Database Defaults
// =============================================================================

pub fn default_database_path() -> String {
    "messages.db".to_string()
}
