//! Outbound IRC messages.
//!
//! The client only ever sends a handful of commands, so a message is kept as
//! a command word, middle parameters and an optional trailing parameter.
//! Serialization never appends the CR-LF terminator; the transport does.

use std::fmt;

/// An outbound IRC message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Message {
    /// Command word, e.g. `PRIVMSG`.
    pub command: String,
    /// Middle parameters. Must not contain spaces.
    pub params: Vec<String>,
    /// Trailing parameter, serialized after `:`.
    pub trailing: Option<String>,
}

impl Message {
    /// Create a message from its parts.
    pub fn new(command: impl Into<String>, params: Vec<String>, trailing: Option<String>) -> Self {
        Self {
            command: command.into(),
            params,
            trailing: trailing.map(strip_line_breaks),
        }
    }

    /// `NICK <nick>`
    pub fn nick(nick: &str) -> Self {
        Self::new("NICK", vec![nick.to_string()], None)
    }

    /// `USER <user> * * :<realname>`
    pub fn user(user: &str, realname: &str) -> Self {
        Self::new(
            "USER",
            vec![user.to_string(), "*".to_string(), "*".to_string()],
            Some(realname.to_string()),
        )
    }

    /// `JOIN <channel>`
    pub fn join(channel: &str) -> Self {
        Self::new("JOIN", vec![channel.to_string()], None)
    }

    /// `PONG :<token>`
    pub fn pong(token: &str) -> Self {
        Self::new("PONG", Vec::new(), Some(token.to_string()))
    }

    /// `QUIT :<reason>`
    pub fn quit(reason: &str) -> Self {
        Self::new("QUIT", Vec::new(), Some(reason.to_string()))
    }

    /// `PRIVMSG <target> :<text>`
    pub fn privmsg(target: &str, text: &str) -> Self {
        Self::new("PRIVMSG", vec![target.to_string()], Some(text.to_string()))
    }

    /// `NOTICE <target> :<text>`
    pub fn notice(target: &str, text: &str) -> Self {
        Self::new("NOTICE", vec![target.to_string()], Some(text.to_string()))
    }

    /// Serialized length in bytes, excluding the terminator.
    pub fn len(&self) -> usize {
        self.to_string().len()
    }

    /// Whether the serialized message is empty. Only true for a message with
    /// an empty command and no parameters.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Remove characters that would terminate or corrupt a protocol line.
fn strip_line_breaks(text: String) -> String {
    if text.contains(['\r', '\n', '\0']) {
        text.replace(['\r', '\n', '\0'], "")
    } else {
        text
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.command)?;
        for param in &self.params {
            write!(f, " {param}")?;
        }
        if let Some(trailing) = &self.trailing {
            write!(f, " :{trailing}")?;
        }
        Ok(())
    }
}
