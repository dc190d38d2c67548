//! troet-bridge - IRC to Mastodon bridge.
//!
//! An IRC client sits in one channel and turns operator commands into
//! Mastodon actions; Mastodon notifications are announced in the channel.

pub mod app;
pub mod config;
pub mod db;
pub mod error;
pub mod irc;
pub mod mastodon;
pub mod router;
pub mod social;
