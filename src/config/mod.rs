//! Configuration loading and management.
//!
//! This module is split into logical submodules:
//! - [`types`]: config struct definitions and loading (Config, IrcConfig, MastodonConfig)
//! - [`defaults`]: serde default value functions
//! - [`validation`]: start-up validation collecting every problem at once

mod defaults;
mod types;
mod validation;

pub use types::{Config, ConfigError, DatabaseConfig, IrcConfig, MastodonConfig, Visibility};
pub use validation::{ValidationError, validate};
