use hush_core::traits::CommandHandler;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Name → handler table, filled once at startup.
#[derive(Default, Clone)]
pub struct CommandRegistry {
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a handler under its (lower-cased) name.
    ///
    /// A handler with a blank name is skipped and `false` returned. A later
    /// registration under an existing name replaces the earlier one.
    pub fn register(&mut self, handler: Arc<dyn CommandHandler>) -> bool {
        let name = handler.name().trim().to_lowercase();
        if name.is_empty() {
            warn!("skipping command handler with empty name");
            return false;
        }
        if self.handlers.insert(name.clone(), handler).is_some() {
            warn!("command '{name}' registered twice, last registration wins");
        } else {
            debug!("registered command '{name}'");
        }
        true
    }

    /// Look up a handler by command name (case-insensitive).
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn CommandHandler>> {
        self.handlers.get(&name.to_lowercase()).cloned()
    }

    /// Registered command names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hush_core::{error::HushError, traits::CommandContext};

    struct Named(&'static str, &'static str);

    #[async_trait]
    impl CommandHandler for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn description(&self) -> &str {
            self.1
        }

        async fn execute(&self, _ctx: &CommandContext<'_>) -> Result<(), HushError> {
            Ok(())
        }
    }

    #[test]
    fn test_register_and_resolve() {
        let mut reg = CommandRegistry::new();
        assert!(reg.register(Arc::new(Named("ping", "a"))));
        assert!(reg.resolve("ping").is_some());
        assert!(reg.resolve("PING").is_some());
        assert!(reg.resolve("pong").is_none());
    }

    #[test]
    fn test_blank_name_is_skipped() {
        let mut reg = CommandRegistry::new();
        assert!(!reg.register(Arc::new(Named("", "a"))));
        assert!(!reg.register(Arc::new(Named("   ", "a"))));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_last_registration_wins() {
        let mut reg = CommandRegistry::new();
        reg.register(Arc::new(Named("ping", "first")));
        reg.register(Arc::new(Named("Ping", "second")));
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.resolve("ping").unwrap().description(), "second");
    }

    #[test]
    fn test_names_sorted() {
        let mut reg = CommandRegistry::new();
        reg.register(Arc::new(Named("yt", "")));
        reg.register(Arc::new(Named("debug", "")));
        reg.register(Arc::new(Named("ping", "")));
        assert_eq!(reg.names(), vec!["debug", "ping", "yt"]);
    }
}
