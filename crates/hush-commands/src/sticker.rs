use async_trait::async_trait;
use hush_core::{
    error::HushError,
    traits::{CommandContext, CommandHandler},
};

/// Reports the hashes WhatsApp uses to identify a sticker.
pub struct StickerIdCommand;

#[async_trait]
impl CommandHandler for StickerIdCommand {
    fn name(&self) -> &str {
        "getstickerid"
    }

    fn description(&self) -> &str {
        "Show the file hashes of a sticker sent with the command"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<(), HushError> {
        let Some(ref sticker) = ctx.message.sticker else {
            return ctx
                .reply(&format!(
                    "❌ Please send a sticker with {}getstickerid",
                    ctx.prefix
                ))
                .await;
        };

        let reply = format!(
            "🪪 Sticker ID:\n\n*fileSha256:*\n`{}`\n\n*fileEncSha256:*\n`{}`",
            hex::encode(&sticker.file_sha256),
            hex::encode(&sticker.file_enc_sha256),
        );
        ctx.reply(&reply).await
    }
}
