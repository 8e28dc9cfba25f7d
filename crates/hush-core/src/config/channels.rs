use super::defaults::*;
use serde::{Deserialize, Serialize};

/// Channel configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChannelConfig {
    pub evolution: Option<EvolutionConfig>,
}

/// Evolution API bridge config.
///
/// The bridge owns the WhatsApp Web session (pairing, credentials,
/// encryption). hush talks to it over REST and receives events on a
/// local webhook listener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Global or instance API key. Falls back to `EVOLUTION_API_KEY`.
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_instance")]
    pub instance: String,
    #[serde(default = "default_webhook_host")]
    pub webhook_host: String,
    #[serde(default = "default_webhook_port")]
    pub webhook_port: u16,
    /// Shared secret expected in the `apikey` header of webhook calls. Empty = unchecked.
    #[serde(default)]
    pub webhook_token: String,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: default_api_url(),
            api_key: String::new(),
            instance: default_instance(),
            webhook_host: default_webhook_host(),
            webhook_port: default_webhook_port(),
            webhook_token: String::new(),
        }
    }
}
