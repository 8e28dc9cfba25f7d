//! WhatsApp via an Evolution API bridge.
//!
//! The bridge (Baileys behind a REST API) owns the WhatsApp Web session:
//! pairing, credentials, and encryption. hush sends through its REST
//! endpoints and receives events on a local webhook listener.

mod connection;
mod events;
mod send;
mod types;
mod webhook;

pub use events::parse_webhook;


use hush_core::config::EvolutionConfig;
use hush_core::message::ConnectionEvent;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

/// Most recent sends remembered for echo suppression.
const SENT_IDS_CAP: usize = 512;

/// IDs of messages we sent. Echoes that never arrive are evicted oldest
/// first once more than `SENT_IDS_CAP` are held.
#[derive(Default)]
pub(super) struct SentIds {
    order: VecDeque<String>,
    ids: HashSet<String>,
}

impl SentIds {
    pub fn insert(&mut self, id: String) {
        if !self.ids.insert(id.clone()) {
            return;
        }
        self.order.push_back(id);
        while self.order.len() > SENT_IDS_CAP {
            if let Some(oldest) = self.order.pop_front() {
                self.ids.remove(&oldest);
            }
        }
    }

    /// Forget `id`, returning whether it was ours.
    pub fn remove(&mut self, id: &str) -> bool {
        if !self.ids.remove(id) {
            return false;
        }
        self.order.retain(|known| known != id);
        true
    }

    #[cfg(test)]
    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.ids.len()
    }
}

/// Connection backed by an Evolution API instance.
pub struct EvolutionChannel {
    pub(super) config: EvolutionConfig,
    pub(super) http: reqwest::Client,
    /// Event sender, set by `start()`.
    pub(super) events_tx: Arc<Mutex<Option<mpsc::Sender<ConnectionEvent>>>>,
    /// IDs of messages we sent, so their echo can be dropped.
    pub(super) sent_ids: Arc<Mutex<SentIds>>,
    pub(super) server: Mutex<Option<JoinHandle<()>>>,
}

impl EvolutionChannel {
    /// Create a new Evolution channel from config.
    pub fn new(config: EvolutionConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
            events_tx: Arc::new(Mutex::new(None)),
            sent_ids: Arc::new(Mutex::new(SentIds::default())),
            server: Mutex::new(None),
        }
    }

    /// `{api_url}/{route}/{instance}`.
    pub(super) fn endpoint(&self, route: &str) -> String {
        format!(
            "{}/{}/{}",
            self.config.api_url.trim_end_matches('/'),
            route,
            self.config.instance
        )
    }

    /// Push an event to the consumer, if one is attached.
    pub(super) async fn emit(&self, event: ConnectionEvent) {
        let tx = self.events_tx.lock().await.clone();
        if let Some(tx) = tx {
            if tx.send(event).await.is_err() {
                tracing::info!("evolution event receiver dropped");
            }
        }
    }
}
