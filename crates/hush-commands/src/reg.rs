use async_trait::async_trait;
use hush_auth::{AuthStore, RegisterOutcome};
use hush_core::{
    error::HushError,
    message::Jid,
    traits::{CommandContext, CommandHandler},
};
use std::sync::Arc;

/// Adds a user or group to the allow-list. Reachable without authorization.
pub struct RegCommand {
    store: Arc<AuthStore>,
}

impl RegCommand {
    pub fn new(store: Arc<AuthStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CommandHandler for RegCommand {
    fn name(&self) -> &str {
        "reg"
    }

    fn description(&self) -> &str {
        "Register a user or group JID (defaults to the current chat)"
    }

    async fn execute(&self, ctx: &CommandContext<'_>) -> Result<(), HushError> {
        let target = match ctx.args.first() {
            Some(raw) => match Jid::parse(raw) {
                Some(jid) => jid,
                None => {
                    return ctx
                        .reply("❌ Invalid JID format. Must include @.")
                        .await;
                }
            },
            None => ctx.sender.clone(),
        };

        let kind = if target.is_group() { "Group" } else { "User" };
        let reply = match self.store.register(&target)? {
            RegisterOutcome::Added => format!("✅ {kind} {target} registered successfully."),
            RegisterOutcome::AlreadyPresent => {
                format!("✅ {kind} {target} is already registered.")
            }
        };
        ctx.reply(&reply).await
    }
}
