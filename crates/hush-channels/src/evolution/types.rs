//! Evolution API request and response payloads.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(super) struct SendTextRequest<'a> {
    pub number: &'a str,
    pub text: &'a str,
}

/// Account-wide presence (`/instance/setPresence`).
#[derive(Debug, Serialize)]
pub(super) struct PresenceRequest<'a> {
    pub presence: &'a str,
}

/// Per-chat presence (`/chat/sendPresence`).
#[derive(Debug, Serialize)]
pub(super) struct ChatPresenceRequest<'a> {
    pub number: &'a str,
    pub presence: &'a str,
    pub delay: u32,
}

/// Instance behaviour settings (`/settings/set`). The bridge expects every field.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct SettingsRequest {
    pub reject_call: bool,
    pub msg_call: String,
    pub groups_ignore: bool,
    pub always_online: bool,
    pub read_messages: bool,
    pub read_status: bool,
    pub sync_full_history: bool,
}

impl SettingsRequest {
    /// Never online, never mark anything as read.
    pub fn stealth() -> Self {
        Self {
            reject_call: false,
            msg_call: String::new(),
            groups_ignore: false,
            always_online: false,
            read_messages: false,
            read_status: false,
            sync_full_history: false,
        }
    }
}

/// Response of `/instance/connect`. Carries a pairing code while the
/// instance is unpaired, or the instance state once it is connected.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ConnectResponse {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub instance: Option<InstanceState>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct InstanceState {
    #[serde(default)]
    pub state: String,
}

/// Response of `/message/sendText`.
#[derive(Debug, Default, Deserialize)]
pub(super) struct SendTextResponse {
    #[serde(default)]
    pub key: Option<MessageKey>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct MessageKey {
    #[serde(default)]
    pub id: Option<String>,
}
