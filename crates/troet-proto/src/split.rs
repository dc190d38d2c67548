//! Splitting outbound text to the protocol line limit.
//!
//! IRC lines are limited to 512 bytes including the CR-LF terminator. Text
//! that does not fit is cut into several messages, always on a UTF-8
//! character boundary so a multi-byte character is never torn in half.

use crate::message::Message;

/// Maximum length of one protocol line, terminator included.
pub const MAX_LINE_LEN: usize = 512;

/// Split `text` into pieces of at most `max_bytes` bytes each, cutting only
/// on character boundaries.
///
/// Text that already fits (including the empty string) comes back as a
/// single piece. If `max_bytes` is smaller than a single character, that
/// character is emitted on its own rather than looping forever.
///
/// ```
/// use troet_proto::split_at_char_boundaries;
///
/// assert_eq!(split_at_char_boundaries("äöü", 4), vec!["äö", "ü"]);
/// ```
pub fn split_at_char_boundaries(text: &str, max_bytes: usize) -> Vec<&str> {
    if text.len() <= max_bytes {
        return vec![text];
    }

    let mut pieces = Vec::new();
    let mut rest = text;
    while rest.len() > max_bytes {
        let mut cut = max_bytes;
        while cut > 0 && !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        if cut == 0 {
            cut = rest.chars().next().map_or(rest.len(), char::len_utf8);
        }
        let (head, tail) = rest.split_at(cut);
        pieces.push(head);
        rest = tail;
    }
    if !rest.is_empty() {
        pieces.push(rest);
    }
    pieces
}

/// Build the `command target :text` messages needed to deliver `text`.
///
/// Embedded newlines start a new message and blank lines are dropped; each
/// resulting line is split so that the serialized message plus terminator
/// stays within [`MAX_LINE_LEN`]. Empty `text` still yields one message.
///
/// ```
/// use troet_proto::split_text;
///
/// let lines = split_text("NOTICE", "#troet", "one\ntwo");
/// assert_eq!(lines[0].to_string(), "NOTICE #troet :one");
/// assert_eq!(lines[1].to_string(), "NOTICE #troet :two");
/// ```
pub fn split_text(command: &str, target: &str, text: &str) -> Vec<Message> {
    // "COMMAND target :" + "\r\n"
    let overhead = command.len() + 1 + target.len() + 2 + 2;
    let budget = MAX_LINE_LEN.saturating_sub(overhead).max(1);

    if text.is_empty() {
        return vec![Message::new(command, vec![target.to_string()], Some(String::new()))];
    }

    text.split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .filter(|line| !line.is_empty())
        .flat_map(|line| split_at_char_boundaries(line, budget))
        .map(|piece| {
            Message::new(
                command,
                vec![target.to_string()],
                Some(piece.to_string()),
            )
        })
        .collect()
}
