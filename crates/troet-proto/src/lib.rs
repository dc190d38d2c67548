//! # troet-proto
//!
//! Sans-IO building blocks for an IRC client connection.
//!
//! Nothing in this crate performs I/O. The bridge feeds raw bytes in and takes
//! formatted protocol lines out, which keeps every piece testable without a
//! socket.
//!
//! ## Features
//!
//! - [`LineFramer`]: turns arbitrary read chunks into CR-LF terminated lines,
//!   holding back incomplete fragments between reads
//! - [`Message`]: outbound message construction and serialization
//! - [`split_text`]: splitting long text into protocol-sized lines without
//!   cutting UTF-8 characters
//! - RFC 1459 casemapping helpers
//! - [`LifecycleState`]: the explicit client connection state machine
//!
//! ## Quick Start
//!
//! ```rust
//! use troet_proto::{LineFramer, Message};
//!
//! let mut framer = LineFramer::new();
//! let lines = framer.push(b"PING :irc.example\r\nPRIVMSG #ch").unwrap();
//! assert_eq!(lines.len(), 1);
//! assert_eq!(framer.leftover(), b"PRIVMSG #ch");
//!
//! let pong = Message::pong("irc.example");
//! assert_eq!(pong.to_string(), "PONG :irc.example");
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod casemap;
pub mod error;
pub mod framer;
pub mod message;
pub mod split;
pub mod state;

pub use self::casemap::{irc_eq, irc_lower_char, irc_to_lower, is_channel, normalize_channel};
pub use self::error::{ProtocolError, Result};
pub use self::framer::{LineFramer, DEFAULT_MAX_BUFFERED, LINE_TERMINATOR};
pub use self::message::Message;
pub use self::split::{split_at_char_boundaries, split_text, MAX_LINE_LEN};
pub use self::state::LifecycleState;
