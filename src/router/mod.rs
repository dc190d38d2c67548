//! Command router.
//!
//! Turns classified IRC messages into social network actions and answers in
//! chat. Every executed command produces exactly one chat message: its result
//! on the channel, or a reply to the invoking message.
//!
//! Permission policy:
//! - direct messages never run commands; they get the command listing
//! - elevated commands from non-operators are ignored without a reply
//! - `.?` runs for everyone in the channel

pub mod commands;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::{SocialError, StoreError};
use crate::irc::{InboundHandler, InboundMessage, MessageKind};
use crate::social::SocialAdapter;
use commands::{CommandAction, Invocation};

pub use commands::{COMMANDS, CommandDefinition, MARKER};

/// Reply to `.?` in the channel.
pub const HELP_REPLY: &str = "To get to know the commands please send me a message via /query";

/// Reply used when storage fails underneath a command.
pub const STORAGE_FAILURE_REPLY: &str = "Something went wrong on my side, please try again later";

/// Where command feedback goes.
#[async_trait]
pub trait ChatSink: Send + Sync {
    /// Send to the bridged channel.
    async fn send(&self, text: &str) -> Result<(), StoreError>;

    /// Answer the stored message `id`. `text` is a template: `%s` stands
    /// for the nick being answered.
    async fn reply(&self, id: &str, text: &str) -> Result<(), StoreError>;

    /// Answer the stored message `id` with `text` as is.
    async fn reply_verbatim(&self, id: &str, text: &str) -> Result<(), StoreError>;
}

/// What became of an inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Not a command.
    Ignored,
    /// Elevated command from a non-operator.
    Denied(&'static str),
    /// Direct message answered with the listing.
    Listing,
    /// Command ran and was acknowledged.
    Executed(&'static str),
}

/// Routes inbound messages to commands.
pub struct CommandRouter {
    chat: Arc<dyn ChatSink>,
    social: Arc<dyn SocialAdapter>,
}

impl CommandRouter {
    pub fn new(chat: Arc<dyn ChatSink>, social: Arc<dyn SocialAdapter>) -> Self {
        Self { chat, social }
    }

    pub async fn route(&self, msg: &InboundMessage) -> RouteOutcome {
        if msg.kind == MessageKind::Direct {
            self.answer(msg, &commands::listing()).await;
            return RouteOutcome::Listing;
        }

        let Some(invocation) = commands::parse(&msg.text) else {
            return RouteOutcome::Ignored;
        };
        let name = invocation.command.name;

        if invocation.command.elevated && msg.kind != MessageKind::ChannelOperator {
            debug!(sender = %msg.sender, command = name, "Ignoring elevated command from non-operator");
            return RouteOutcome::Denied(name);
        }

        info!(sender = %msg.sender, command = name, "Running command");
        let feedback = match self.execute(&invocation).await {
            Ok(feedback) => feedback,
            Err(failure) => Feedback::Failed(failure.into_reply()),
        };
        match feedback {
            Feedback::Announce(text) => {
                if let Err(e) = self.chat.send(&text).await {
                    error!(error = %e, "Failed to record command result");
                }
            }
            Feedback::Answer(text) => self.answer(msg, &text).await,
            Feedback::Failed(text) => {
                if let Err(e) = self.chat.reply_verbatim(&msg.id, &text).await {
                    error!(error = %e, id = %msg.id, "Failed to reply");
                }
            }
        }
        RouteOutcome::Executed(name)
    }

    /// Run the action and produce its feedback.
    async fn execute(&self, invocation: &Invocation<'_>) -> Result<Feedback, Failure> {
        let args = &invocation.args;
        let text = match invocation.command.action {
            CommandAction::Toot => {
                let id = self
                    .social
                    .send(args[0])
                    .await
                    .map_err(Failure::context("Error during sending"))?;
                self.with_preview(format!("[{id}] Toot successful"), &id).await
            }
            CommandAction::Reply => {
                let id = self
                    .social
                    .reply(args[0], args[1])
                    .await
                    .map_err(Failure::context("Error replying"))?;
                self.with_preview(format!("[{id}] Reply successful"), &id).await
            }
            CommandAction::Delete => {
                self.social
                    .delete(args[0])
                    .await
                    .map_err(Failure::context("Error deleting toot"))?;
                format!("Successfully deleted toot {}", args[0])
            }
            CommandAction::Search => {
                let id = self
                    .social
                    .search(args[0])
                    .await
                    .map_err(Failure::context("Error finding toot"))?;
                self.social
                    .get_message(&id)
                    .await
                    .map_err(Failure::context("Error finding toot"))?
            }
            CommandAction::Boost => {
                let boosted = self
                    .social
                    .boost(args[0])
                    .await
                    .map_err(Failure::context("Error boosting toot"))?;
                let verb = if boosted { "Boosted" } else { "Un-Boosted" };
                format!("{verb} {}", args[0])
            }
            CommandAction::Favourite => {
                let faved = self
                    .social
                    .favorite(args[0])
                    .await
                    .map_err(Failure::context("Error favoriting toot"))?;
                let verb = if faved { "Faved" } else { "Un-Faved" };
                format!("{verb} {}", args[0])
            }
            CommandAction::Help => return Ok(Feedback::Answer(HELP_REPLY.to_string())),
        };
        Ok(Feedback::Announce(text))
    }

    /// Append the rendered toot; a failed render still counts as success.
    async fn with_preview(&self, headline: String, id: &str) -> String {
        match self.social.get_message(id).await {
            Ok(preview) => format!("{headline}\n{preview}"),
            Err(e) => {
                warn!(id, error = %e, "Posted toot could not be rendered");
                headline
            }
        }
    }

    async fn answer(&self, msg: &InboundMessage, text: &str) {
        if let Err(e) = self.chat.reply(&msg.id, text).await {
            error!(error = %e, id = %msg.id, "Failed to reply");
        }
    }
}

/// The single chat message a command produces.
enum Feedback {
    /// Posted to the channel.
    Announce(String),
    /// Sent as a reply to the invoking message.
    Answer(String),
    /// Error text, possibly quoting the remote side; replied without
    /// template substitution.
    Failed(String),
}

/// An adapter error together with the step that failed.
struct Failure {
    context: &'static str,
    error: SocialError,
}

impl Failure {
    fn context(context: &'static str) -> impl Fn(SocialError) -> Failure {
        move |error| Failure { context, error }
    }

    fn into_reply(self) -> String {
        let Failure { context, error } = self;
        match error {
            SocialError::NotFound(_) | SocialError::NoResults => error.to_string(),
            SocialError::Storage(e) => {
                error!(error = %e, context, "Storage failure while running command");
                STORAGE_FAILURE_REPLY.to_string()
            }
            other => format!("{context}: {other}"),
        }
    }
}

#[async_trait]
impl InboundHandler for CommandRouter {
    async fn handle(&self, msg: InboundMessage) {
        let outcome = self.route(&msg).await;
        debug!(id = %msg.id, ?outcome, "Routed message");
    }
}
