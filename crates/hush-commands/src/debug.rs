use async_trait::async_trait;
use hush_core::{
    error::HushError,
    traits::{CommandContext, CommandHandler},
};
use tracing::info;

/// Dumps the raw inbound payload to the log.
pub struct DebugCommand;

#[async_trait]
impl CommandHandler for DebugCommand {
    fn name(&self) -> &str {
        "debug"
    }

    fn description(&self) -> &str {
        "Log the full incoming message payload"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<(), HushError> {
        let dump = serde_json::to_string_pretty(ctx.message)?;
        info!("full message from {}:\n{dump}", ctx.sender);
        ctx.reply("✅ Message logged to console.").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{message_from, run, RecordingConnection};

    #[tokio::test]
    async fn test_debug_acknowledges() {
        let conn = RecordingConnection::default();
        let mut msg = message_from("1@s.whatsapp.net");
        msg.raw = serde_json::json!({"key": {"id": "ABC"}});
        run(&DebugCommand, &conn, &msg, &[]).await.unwrap();
        assert_eq!(conn.texts(), vec!["✅ Message logged to console."]);
    }
}
