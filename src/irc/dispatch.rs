//! Line dispatch.
//!
//! Every inbound line is tested against every rule, in order, and all
//! matching handlers run. Several effects legitimately hang off one line: the
//! end of the MOTD both joins the channel and identifies with NickServ.
//!
//! Handlers are plain functions over the regex captures and the shared
//! [`Session`]. They must tolerate seeing the same line twice.

use regex::{Captures, Regex};
use std::sync::Arc;
use tracing::{debug, error, warn};
use troet_proto::{LifecycleState, Message, irc_eq, is_channel};

use super::inbound::{InboundMessage, MessageKind};
use super::session::Session;

/// A rule handler.
pub type Handler = fn(&Captures<'_>, &Arc<Session>);

/// An immutable (pattern, handler) pair.
pub struct DispatchRule {
    pub name: &'static str,
    pub pattern: Regex,
    pub handler: Handler,
}

impl DispatchRule {
    pub fn new(name: &'static str, pattern: &str, handler: Handler) -> Result<Self, regex::Error> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
            handler,
        })
    }
}

/// Ordered list of rules consulted for every line.
pub struct DispatchTable {
    rules: Vec<DispatchRule>,
}

impl DispatchTable {
    pub fn new(rules: Vec<DispatchRule>) -> Self {
        Self { rules }
    }

    /// The rules the bridge runs with.
    pub fn standard() -> Result<Self, regex::Error> {
        Ok(Self::new(vec![
            DispatchRule::new("ping", r"^(?::\S+ )?PING :?(.+)$", on_ping)?,
            DispatchRule::new("registered", r"^:\S+ (?:376|422) (\S+)", on_registered)?,
            DispatchRule::new("identify", r"^:\S+ (?:376|422) (\S+)", on_identify)?,
            DispatchRule::new("nick-in-use", r"^:\S+ 433 \S+ (\S+)", on_nick_in_use)?,
            DispatchRule::new("names", r"^:\S+ 353 \S+ [=*@] (\S+) :?(.*)$", on_names)?,
            DispatchRule::new("mode", r"^:\S+ MODE ([#&+!]\S*) (\S+)(?: (.+))?$", on_mode)?,
            DispatchRule::new("privmsg", r"^:([^!@\s]+)\S* PRIVMSG (\S+) :?(.*)$", on_privmsg)?,
        ]))
    }

    /// Run every matching rule against `line`. Returns how many matched.
    pub fn dispatch(&self, line: &str, session: &Arc<Session>) -> usize {
        let mut matched = 0;
        for rule in &self.rules {
            if let Some(caps) = rule.pattern.captures(line) {
                matched += 1;
                (rule.handler)(&caps, session);
            }
        }
        if matched == 0 {
            debug!(line, "Unhandled line");
        }
        matched
    }
}

fn on_ping(caps: &Captures<'_>, session: &Arc<Session>) {
    session.enqueue(Message::pong(&caps[1]));
}

fn on_registered(caps: &Captures<'_>, session: &Arc<Session>) {
    session.set_current_nick(&caps[1]);
    session.enqueue(Message::join(session.channel()));
    session.set_state(LifecycleState::Active);
}

fn on_identify(caps: &Captures<'_>, session: &Arc<Session>) {
    if let Some(password) = &session.identity().nick_password {
        let text = format!("identify {} {}", &caps[1], password);
        session.enqueue(Message::privmsg("NickServ", &text));
    }
}

fn on_nick_in_use(caps: &Captures<'_>, session: &Arc<Session>) {
    // Only while registering; later collisions come from our own NICK changes
    if session.state() != LifecycleState::Registering {
        return;
    }
    let next = format!("{}_", &caps[1]);
    warn!(taken = &caps[1], trying = %next, "Nickname in use");
    session.set_current_nick(&next);
    session.enqueue(Message::nick(&next));
}

fn on_names(caps: &Captures<'_>, session: &Arc<Session>) {
    session
        .operators()
        .ingest_names(&caps[1], caps[2].split_whitespace());
}

/// Channel modes that consume a parameter regardless of direction.
const PARAM_MODES: &str = "ovhbeIqak";

fn on_mode(caps: &Captures<'_>, session: &Arc<Session>) {
    let channel = &caps[1];
    let mut params = caps.get(3).map_or("", |m| m.as_str()).split_whitespace();
    let mut adding = true;

    for mode in caps[2].chars() {
        match mode {
            '+' => adding = true,
            '-' => adding = false,
            'o' => {
                if let Some(nick) = params.next() {
                    session.operators().set_operator(channel, nick, adding);
                }
            }
            'l' if adding => {
                params.next();
            }
            m if PARAM_MODES.contains(m) => {
                params.next();
            }
            _ => {}
        }
    }
}

/// Decide how an inbound PRIVMSG concerns us, if at all.
pub fn classify(session: &Session, sender: &str, target: &str) -> Option<MessageKind> {
    let me = session.current_nick();
    if irc_eq(sender, &me) {
        return None;
    }

    if is_channel(target) {
        if !irc_eq(target, session.channel()) {
            debug!(channel = %target, "Message for a channel we do not serve");
            return None;
        }
        if session.operators().is_operator(target, sender) {
            Some(MessageKind::ChannelOperator)
        } else {
            Some(MessageKind::ChannelUser)
        }
    } else if irc_eq(target, &me) {
        Some(MessageKind::Direct)
    } else {
        warn!(recipient = %target, sender = %sender, "Message for an unexpected target");
        None
    }
}

fn on_privmsg(caps: &Captures<'_>, session: &Arc<Session>) {
    let sender = caps[1].to_string();
    let target = caps[2].to_string();
    let text = caps[3].to_string();
    // Classify now, so the operator state matches the moment the line arrived
    let kind = classify(session, &sender, &target);
    let session = Arc::clone(session);

    tokio::spawn(async move {
        let id = match session.store().store(&sender, &target, &text).await {
            Ok(id) => id,
            Err(e) => {
                error!(error = %e, sender = %sender, recipient = %target, "Failed to store inbound message");
                return;
            }
        };

        let Some(kind) = kind else { return };
        let Some(handler) = session.inbound_handler() else {
            debug!(sender = %sender, "No inbound handler registered");
            return;
        };
        handler
            .handle(InboundMessage {
                kind,
                sender,
                target,
                text,
                id,
            })
            .await;
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::irc::inbound::InboundHandler;
    use crate::irc::session::test_support::*;
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    fn table() -> DispatchTable {
        DispatchTable::standard().unwrap()
    }

    #[test]
    fn test_ping_reply() {
        let session = session_with(Arc::default(), None);
        assert_eq!(table().dispatch("PING :irc.example.net", &session), 1);
        assert_eq!(drain(&session), vec!["PONG :irc.example.net"]);

        table().dispatch(":irc.example.net PING token", &session);
        assert_eq!(drain(&session), vec!["PONG :token"]);
    }

    #[test]
    fn test_end_of_motd_fires_join_and_identify() {
        let session = session_with(Arc::default(), Some("hunter2"));
        session.set_state(LifecycleState::Connecting);
        session.set_state(LifecycleState::Registering);

        let matched = table().dispatch(":irc.example.net 376 troetbot :End of /MOTD command.", &session);
        assert_eq!(matched, 2);
        assert_eq!(
            drain(&session),
            vec!["JOIN #troet", "PRIVMSG NickServ :identify troetbot hunter2"]
        );
        assert_eq!(session.state(), LifecycleState::Active);
    }

    #[test]
    fn test_no_motd_without_password() {
        let session = session_with(Arc::default(), None);
        table().dispatch(":irc.example.net 422 troetbot :MOTD File is missing", &session);
        assert_eq!(drain(&session), vec!["JOIN #troet"]);
    }

    #[test]
    fn test_nick_in_use_while_registering() {
        let session = session_with(Arc::default(), None);
        session.set_state(LifecycleState::Connecting);
        session.set_state(LifecycleState::Registering);

        table().dispatch(":irc.example.net 433 * troetbot :Nickname is already in use", &session);
        assert_eq!(drain(&session), vec!["NICK troetbot_"]);
        assert_eq!(session.current_nick(), "troetbot_");
    }

    #[test]
    fn test_names_and_mode() {
        let session = session_with(Arc::default(), None);
        let table = table();

        table.dispatch(":irc.example.net 353 troetbot = #troet :@alice bob +carol", &session);
        assert!(session.operators().is_operator("#troet", "alice"));
        assert!(!session.operators().is_operator("#troet", "bob"));

        table.dispatch(":alice!a@host MODE #troet +o-o+v bob alice carol", &session);
        assert!(session.operators().is_operator("#troet", "bob"));
        assert!(!session.operators().is_operator("#troet", "alice"));
        assert!(!session.operators().is_operator("#troet", "carol"));
    }

    #[test]
    fn test_mode_skips_parameters_of_other_modes() {
        let session = session_with(Arc::default(), None);
        table().dispatch(":op!o@h MODE #troet +bo *!*@spam dave", &session);
        assert!(session.operators().is_operator("#troet", "dave"));
        assert!(!session.operators().is_operator("#troet", "*!*@spam"));

        table().dispatch(":op!o@h MODE #troet +lo 10 erin", &session);
        assert!(session.operators().is_operator("#troet", "erin"));

        table().dispatch(":op!o@h MODE #troet -lo erin", &session);
        assert!(!session.operators().is_operator("#troet", "erin"));
    }

    #[test]
    fn test_user_mode_ignored() {
        let session = session_with(Arc::default(), None);
        assert_eq!(table().dispatch(":troetbot MODE troetbot :+i", &session), 0);
    }

    #[test]
    fn test_classify() {
        let session = session_with(Arc::default(), None);
        session.operators().set_operator("#troet", "alice", true);

        assert_eq!(classify(&session, "alice", "#Troet"), Some(MessageKind::ChannelOperator));
        assert_eq!(classify(&session, "bob", "#troet"), Some(MessageKind::ChannelUser));
        assert_eq!(classify(&session, "bob", "TroetBot"), Some(MessageKind::Direct));
        assert_eq!(classify(&session, "bob", "#elsewhere"), None);
        assert_eq!(classify(&session, "troetbot", "#troet"), None);
        assert_eq!(classify(&session, "bob", "someoneelse"), None);
    }

    struct Forward(mpsc::UnboundedSender<InboundMessage>);

    #[async_trait]
    impl InboundHandler for Forward {
        async fn handle(&self, msg: InboundMessage) {
            let _ = self.0.send(msg);
        }
    }

    #[tokio::test]
    async fn test_privmsg_is_stored_and_forwarded() {
        let store = Arc::new(MemoryStore::default());
        let session = session_with(store.clone(), None);
        let (tx, mut rx) = mpsc::unbounded_channel();
        session.set_inbound_handler(Arc::new(Forward(tx)));
        session.operators().set_operator("#troet", "alice", true);

        table().dispatch(":alice!a@example.org PRIVMSG #troet :.t hello world", &session);
        let msg = rx.recv().await.unwrap();

        assert_eq!(msg.kind, MessageKind::ChannelOperator);
        assert_eq!(msg.sender, "alice");
        assert_eq!(msg.target, "#troet");
        assert_eq!(msg.text, ".t hello world");
        assert_eq!(msg.id, "1");
        assert_eq!(store.rows.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_own_messages_are_stored_not_forwarded() {
        let store = Arc::new(MemoryStore::default());
        let session = session_with(store.clone(), None);
        let (tx, mut rx) = mpsc::unbounded_channel();
        session.set_inbound_handler(Arc::new(Forward(tx)));

        table().dispatch(":troetbot!t@h PRIVMSG #troet :echo", &session);
        table().dispatch(":bob!b@h PRIVMSG troetbot :hi", &session);

        let msg = rx.recv().await.unwrap();
        assert_eq!(msg.kind, MessageKind::Direct);
        assert_eq!(msg.text, "hi");

        for _ in 0..100 {
            if store.rows.lock().len() == 2 {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        assert_eq!(store.rows.lock().len(), 2);
        assert!(rx.try_recv().is_err());
    }
}
