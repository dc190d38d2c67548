//! IRC case-mapping functions.
//!
//! IRC compares nicknames and channel names case-insensitively, and RFC 1459
//! additionally treats `[]\~` as the uppercase forms of `{}|^`. Operator
//! tables and channel comparisons in the bridge go through these helpers so
//! that `#Troet` and `#troet` are the same channel.

/// Characters that start a channel name.
const CHANNEL_SIGILS: [char; 4] = ['#', '&', '+', '!'];

/// Convert a single character to IRC lowercase using RFC 1459 case mapping.
#[inline]
pub const fn irc_lower_char(c: char) -> char {
    match c {
        '[' => '{',
        ']' => '}',
        '\\' => '|',
        '~' => '^',
        'A'..='Z' => (c as u8 + 32) as char,
        _ => c,
    }
}

/// Convert a string to IRC lowercase using RFC 1459 case mapping.
pub fn irc_to_lower(s: &str) -> String {
    s.chars().map(irc_lower_char).collect()
}

/// Compare two strings using IRC case-insensitive comparison.
pub fn irc_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    a.chars()
        .zip(b.chars())
        .all(|(ca, cb)| irc_lower_char(ca) == irc_lower_char(cb))
}

/// Whether `target` names a channel rather than a nickname.
pub fn is_channel(target: &str) -> bool {
    target.starts_with(CHANNEL_SIGILS)
}

/// Normalize a configured channel name: add the `#` sigil when it is
/// missing and lower-case it.
///
/// ```
/// use troet_proto::normalize_channel;
///
/// assert_eq!(normalize_channel("Troet"), "#troet");
/// assert_eq!(normalize_channel("&Local"), "&local");
/// ```
pub fn normalize_channel(name: &str) -> String {
    let name = name.trim();
    if is_channel(name) {
        irc_to_lower(name)
    } else {
        irc_to_lower(&format!("#{name}"))
    }
}
