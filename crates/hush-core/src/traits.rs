use crate::{
    error::HushError,
    message::{ConnectionEvent, InboundMessage, Jid, Presence},
};
use async_trait::async_trait;

/// Messaging connection: the transport the bot rides on.
///
/// Implementations own the network session. The bot only consumes the event
/// stream, sends replies, and announces presence.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Human-readable connection name.
    fn name(&self) -> &str;

    /// Open the session. Returns a receiver that yields connection events
    /// for the lifetime of the connection, across reconnects.
    async fn start(&self) -> Result<tokio::sync::mpsc::Receiver<ConnectionEvent>, HushError>;

    /// Re-establish a closed session. Events keep flowing on the receiver
    /// returned by `start()`.
    async fn reconnect(&self) -> Result<(), HushError>;

    /// Send a text message to a chat.
    async fn send_text(&self, to: &Jid, text: &str) -> Result<(), HushError>;

    /// Announce a presence value.
    async fn send_presence(&self, presence: Presence) -> Result<(), HushError>;

    /// Graceful shutdown.
    async fn stop(&self) -> Result<(), HushError>;
}

/// Grouped context for command execution.
pub struct CommandContext<'a> {
    pub connection: &'a dyn Connection,
    /// Chat that issued the command; replies go here.
    pub sender: &'a Jid,
    pub args: &'a [String],
    pub message: &'a InboundMessage,
    /// Trigger prefix the command was invoked with (for usage hints).
    pub prefix: &'a str,
}

impl CommandContext<'_> {
    /// Reply to the sender.
    pub async fn reply(&self, text: &str) -> Result<(), HushError> {
        self.connection.send_text(self.sender, text).await
    }
}

/// A named command handler.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Command name, matched case-insensitively against the first token.
    fn name(&self) -> &str;

    /// One-line description.
    fn description(&self) -> &str {
        ""
    }

    /// Run the command. Any error is contained by the dispatcher.
    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<(), HushError>;
}
