//! # hush-commands
//!
//! The command registry and the handlers shipped with hush. Handlers are
//! registered explicitly at startup from [`builtin_handlers`]; there is no
//! runtime plugin discovery.

mod debug;
mod media;
mod ping;
mod reg;
mod registry;
mod sticker;

#[cfg(test)]
mod testing;

pub use debug::DebugCommand;
pub use media::{is_youtube_url, SongCommand, VideoCommand, YtCommand};
pub use ping::PingCommand;
pub use reg::RegCommand;
pub use registry::CommandRegistry;
pub use sticker::StickerIdCommand;

use hush_auth::AuthStore;
use hush_core::{config::CommandsConfig, traits::CommandHandler};
use std::sync::Arc;
use tracing::debug;

/// Every handler shipped with hush, in registration order.
pub fn builtin_handlers(store: Arc<AuthStore>) -> Vec<Arc<dyn CommandHandler>> {
    vec![
        Arc::new(RegCommand::new(store)),
        Arc::new(PingCommand),
        Arc::new(StickerIdCommand),
        Arc::new(DebugCommand),
        Arc::new(YtCommand),
        Arc::new(SongCommand),
        Arc::new(VideoCommand),
    ]
}

/// Registry of the built-ins selected by `[commands] enabled`.
pub fn build_registry(store: Arc<AuthStore>, config: &CommandsConfig) -> CommandRegistry {
    let mut registry = CommandRegistry::new();
    for handler in builtin_handlers(store) {
        if config.is_enabled(handler.name()) {
            registry.register(handler);
        } else {
            debug!("command '{}' disabled by config", handler.name());
        }
    }
    registry
}
