//! Channel operator tracking.
//!
//! Operator status is learned from NAMES replies and MODE changes and is only
//! consulted to gate elevated commands. Channel and nick keys are casemapped,
//! so `#Troet`/`Alice` and `#troet`/`alice` are the same entry.

use dashmap::DashMap;
use std::collections::HashSet;
use troet_proto::irc_to_lower;

/// Membership prefixes that may precede a nick in a NAMES reply.
const NAMES_PREFIXES: &[char] = &['~', '&', '@', '%', '+'];

/// Per-channel set of nicks currently holding operator status.
///
/// Channels are created lazily on the first relevant event. A missing channel
/// or nick simply means "not an operator".
#[derive(Debug, Default)]
pub struct OperatorTracker {
    channels: DashMap<String, HashSet<String>>,
}

impl OperatorTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingest one NAMES reply (`353`) for `channel`.
    ///
    /// Each name carrying an `@` among its prefixes is recorded as operator.
    /// Names without it are removed, so a fresh snapshot corrects stale state.
    pub fn ingest_names<'a>(&self, channel: &str, names: impl IntoIterator<Item = &'a str>) {
        let mut ops = self.channels.entry(irc_to_lower(channel)).or_default();
        for entry in names {
            let nick = entry.trim_start_matches(NAMES_PREFIXES);
            if nick.is_empty() {
                continue;
            }
            let prefixes = &entry[..entry.len() - nick.len()];
            let nick = irc_to_lower(nick);
            if prefixes.contains('@') {
                ops.insert(nick);
            } else {
                ops.remove(&nick);
            }
        }
    }

    /// Apply a `+o`/`-o` mode change.
    pub fn set_operator(&self, channel: &str, nick: &str, is_op: bool) {
        let nick = irc_to_lower(nick);
        let mut ops = self.channels.entry(irc_to_lower(channel)).or_default();
        if is_op {
            ops.insert(nick);
        } else {
            ops.remove(&nick);
        }
    }

    /// Whether `nick` is known to be operator in `channel`.
    pub fn is_operator(&self, channel: &str, nick: &str) -> bool {
        self.channels
            .get(&irc_to_lower(channel))
            .is_some_and(|ops| ops.contains(&irc_to_lower(nick)))
    }

    /// Forget everything, e.g. after the connection was lost.
    pub fn clear(&self) {
        self.channels.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_channel_is_not_operator() {
        let tracker = OperatorTracker::new();
        assert!(!tracker.is_operator("#nowhere", "alice"));
    }

    #[test]
    fn test_names_snapshot() {
        let tracker = OperatorTracker::new();
        tracker.ingest_names("#troet", "@alice +bob carol ~@dave".split(' '));

        assert!(tracker.is_operator("#troet", "alice"));
        assert!(!tracker.is_operator("#troet", "bob"));
        assert!(!tracker.is_operator("#troet", "carol"));
        assert!(tracker.is_operator("#troet", "dave"));
        assert!(!tracker.is_operator("#troet", "@alice"));
    }

    #[test]
    fn test_casemapped_lookup() {
        let tracker = OperatorTracker::new();
        tracker.ingest_names("#Troet", ["@Alice[m]"]);
        assert!(tracker.is_operator("#troet", "alice{m}"));
    }

    #[test]
    fn test_mode_changes_last_write_wins() {
        let tracker = OperatorTracker::new();
        tracker.set_operator("#troet", "alice", true);
        tracker.set_operator("#troet", "alice", false);
        tracker.set_operator("#troet", "alice", true);
        assert!(tracker.is_operator("#troet", "alice"));

        tracker.set_operator("#troet", "alice", false);
        assert!(!tracker.is_operator("#troet", "alice"));
    }

    #[test]
    fn test_demote_unknown_is_harmless() {
        let tracker = OperatorTracker::new();
        tracker.set_operator("#troet", "ghost", false);
        assert!(!tracker.is_operator("#troet", "ghost"));
    }

    #[test]
    fn test_snapshot_removes_stale_op() {
        let tracker = OperatorTracker::new();
        tracker.set_operator("#troet", "alice", true);
        tracker.ingest_names("#troet", ["alice"]);
        assert!(!tracker.is_operator("#troet", "alice"));
    }

    #[test]
    fn test_channels_are_independent() {
        let tracker = OperatorTracker::new();
        tracker.set_operator("#one", "alice", true);
        assert!(!tracker.is_operator("#two", "alice"));
    }
}
