//! Presence filter that keeps the account looking offline.

use async_trait::async_trait;
use hush_core::{
    error::HushError,
    message::{ConnectionEvent, Jid, Presence},
    traits::Connection,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

/// Wraps a connection so that the only presence ever announced is
/// `Unavailable`. Everything else passes straight through.
pub struct StealthConnection {
    inner: Arc<dyn Connection>,
}

impl StealthConnection {
    pub fn new(inner: Arc<dyn Connection>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Connection for StealthConnection {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn start(&self) -> Result<mpsc::Receiver<ConnectionEvent>, HushError> {
        self.inner.start().await
    }

    async fn reconnect(&self) -> Result<(), HushError> {
        self.inner.reconnect().await
    }

    async fn send_text(&self, to: &Jid, text: &str) -> Result<(), HushError> {
        self.inner.send_text(to, text).await
    }

    async fn send_presence(&self, presence: Presence) -> Result<(), HushError> {
        if presence != Presence::Unavailable {
            debug!("stealth: dropped presence '{}'", presence.as_str());
            return Ok(());
        }
        self.inner.send_presence(presence).await
    }

    async fn stop(&self) -> Result<(), HushError> {
        self.inner.stop().await
    }
}
