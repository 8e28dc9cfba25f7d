use async_trait::async_trait;
use hush_core::{
    error::HushError,
    traits::{CommandContext, CommandHandler},
};
use std::time::Instant;

/// Latency check: answers `pong!`, then how long that answer took to send.
pub struct PingCommand;

#[async_trait]
impl CommandHandler for PingCommand {
    fn name(&self) -> &str {
        "ping"
    }

    fn description(&self) -> &str {
        "Check that the bot is alive and measure reply latency"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<(), HushError> {
        let started = Instant::now();
        ctx.reply("pong!").await?;
        let ms = started.elapsed().as_millis();
        ctx.reply(&format!("pong! {ms} ms")).await
    }
}
