//! Recording connection for handler tests.

use async_trait::async_trait;
use hush_core::{
    error::HushError,
    message::{ConnectionEvent, InboundMessage, Jid, Presence},
    traits::{CommandContext, CommandHandler, Connection},
};
use std::sync::Mutex;
use tokio::sync::mpsc;

#[derive(Default)]
pub(crate) struct RecordingConnection {
    pub sent: Mutex<Vec<(Jid, String)>>,
}

impl RecordingConnection {
    pub fn texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
    }
}

#[async_trait]
impl Connection for RecordingConnection {
    fn name(&self) -> &str {
        "recording"
    }

    async fn start(&self) -> Result<mpsc::Receiver<ConnectionEvent>, HushError> {
        let (_tx, rx) = mpsc::channel(1);
        Ok(rx)
    }

    async fn reconnect(&self) -> Result<(), HushError> {
        Ok(())
    }

    async fn send_text(&self, to: &Jid, text: &str) -> Result<(), HushError> {
        self.sent.lock().unwrap().push((to.clone(), text.to_string()));
        Ok(())
    }

    async fn send_presence(&self, _presence: Presence) -> Result<(), HushError> {
        Ok(())
    }

    async fn stop(&self) -> Result<(), HushError> {
        Ok(())
    }
}

/// Run `handler` as if `sender` had typed `.<name> <args>`.
pub(crate) async fn run(
    handler: &dyn CommandHandler,
    conn: &RecordingConnection,
    message: &InboundMessage,
    args: &[&str],
) -> Result<(), HushError> {
    let args: Vec<String> = args.iter().map(|a| a.to_string()).collect();
    let ctx = CommandContext {
        connection: conn,
        sender: &message.chat,
        args: &args,
        message,
        prefix: ".",
    };
    handler.execute(&ctx).await
}

pub(crate) fn message_from(sender: &str) -> InboundMessage {
    InboundMessage::text(Jid::new(sender), "")
}
