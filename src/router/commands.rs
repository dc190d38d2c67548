//! The chat command surface.
//!
//! Commands start with [`MARKER`] immediately followed by the command name.
//! Commands taking arguments need a space after the name; anything else is
//! not a command invocation and is ignored.

/// Prefix that introduces a command.
pub const MARKER: char = '.';

/// What a command does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    Toot,
    Reply,
    Delete,
    Search,
    Boost,
    Favourite,
    Help,
}

/// A registered chat command.
#[derive(Debug)]
pub struct CommandDefinition {
    pub name: &'static str,
    /// Usage shown in the command listing.
    pub usage: &'static str,
    pub description: &'static str,
    pub required_args: usize,
    /// Only channel operators may run it.
    pub elevated: bool,
    pub action: CommandAction,
}

/// Every command, in listing order.
pub static COMMANDS: &[CommandDefinition] = &[
    CommandDefinition {
        name: "t",
        usage: "<text>",
        description: "Posts a toot. Toot content is the text following after",
        required_args: 1,
        elevated: true,
        action: CommandAction::Toot,
    },
    CommandDefinition {
        name: "r",
        usage: "<id> <text>",
        description: "Replies to a toot. First parameter is the ID to reply to, everything after is the content of the reply",
        required_args: 2,
        elevated: true,
        action: CommandAction::Reply,
    },
    CommandDefinition {
        name: "d",
        usage: "<id>",
        description: "Deletes a toot. One parameter with the toot's id expected",
        required_args: 1,
        elevated: true,
        action: CommandAction::Delete,
    },
    CommandDefinition {
        name: "s",
        usage: "<link>",
        description: "Search a toot & load it into the bot to get a ID for other commands. Parameter should be the permanent link",
        required_args: 1,
        elevated: true,
        action: CommandAction::Search,
    },
    CommandDefinition {
        name: "b",
        usage: "<id>",
        description: "(Un-)Boosts a toot (toggle). Parameter is the ID of the toot to boost",
        required_args: 1,
        elevated: true,
        action: CommandAction::Boost,
    },
    CommandDefinition {
        name: "f",
        usage: "<id>",
        description: "(Un-)Favourites a toot (toggle). Parameter is the ID of the toot to favourite",
        required_args: 1,
        elevated: true,
        action: CommandAction::Favourite,
    },
    CommandDefinition {
        name: "?",
        usage: "",
        description: "The help command (redirects you to here)",
        required_args: 0,
        elevated: false,
        action: CommandAction::Help,
    },
];

/// A recognized command with its arguments.
#[derive(Debug)]
pub struct Invocation<'a> {
    pub command: &'static CommandDefinition,
    /// Exactly `required_args` entries; the last one takes the rest of the line.
    pub args: Vec<&'a str>,
}

/// Recognize a command invocation.
///
/// Returns `None` for ordinary chat, unknown commands and invocations with
/// missing arguments.
pub fn parse(text: &str) -> Option<Invocation<'_>> {
    let rest = text.strip_prefix(MARKER)?;

    for command in COMMANDS {
        let Some(after) = rest.strip_prefix(command.name) else {
            continue;
        };

        if command.required_args == 0 {
            if after.is_empty() || after.starts_with(' ') {
                return Some(Invocation {
                    command,
                    args: Vec::new(),
                });
            }
            continue;
        }

        let Some(raw) = after.strip_prefix(' ') else {
            continue;
        };
        let args = split_args(raw, command.required_args)?;
        return Some(Invocation { command, args });
    }
    None
}

/// Split into exactly `n` non-empty arguments, the last one keeping spaces.
fn split_args(raw: &str, n: usize) -> Option<Vec<&str>> {
    let mut args = Vec::with_capacity(n);
    let mut rest = raw.trim_start();
    for _ in 1..n {
        let (arg, tail) = rest.split_once(' ')?;
        args.push(arg);
        rest = tail.trim_start();
    }
    let last = rest.trim_end();
    if last.is_empty() {
        return None;
    }
    args.push(last);
    Some(args)
}

/// The listing sent in reply to direct messages.
pub fn listing() -> String {
    let mut out = String::from("Available commands (in the channel, operators only unless noted):");
    for command in COMMANDS {
        let usage = if command.usage.is_empty() {
            format!("{MARKER}{}", command.name)
        } else {
            format!("{MARKER}{} {}", command.name, command.usage)
        };
        let note = if command.elevated { "" } else { " (everyone)" };
        out.push_str(&format!("\n{usage} - {}{note}", command.description));
    }
    out
}
