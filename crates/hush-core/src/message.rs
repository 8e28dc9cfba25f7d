use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Server suffix that marks a group conversation.
pub const GROUP_SERVER: &str = "@g.us";

/// A WhatsApp identity (JID): an individual correspondent or a group.
///
/// Comparison is exact and case-sensitive. No normalization is applied, so
/// `"123@s.whatsapp.net"` and `"123@S.WHATSAPP.NET"` are different identities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Jid(String);

impl Jid {
    /// Wrap a raw identity string as received from the network layer.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Parse a user-supplied identity. Returns `None` unless it is non-empty
    /// and contains an `@`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() || !trimmed.contains('@') {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    /// Whether this identity names a group conversation.
    pub fn is_group(&self) -> bool {
        self.0.ends_with(GROUP_SERVER)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The user/number part before the `@`.
    pub fn user(&self) -> &str {
        self.0.split('@').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for Jid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Jid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Hashes carried by a sticker attachment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StickerInfo {
    pub file_sha256: Vec<u8>,
    pub file_enc_sha256: Vec<u8>,
}

/// An inbound message delivered by the connection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Network message id.
    pub id: String,
    /// Conversation the message arrived in. Authorization key and reply target.
    pub chat: Jid,
    /// Author inside a group conversation.
    #[serde(default)]
    pub participant: Option<Jid>,
    /// Whether the bot's own account sent this message.
    #[serde(default)]
    pub from_me: bool,
    #[serde(default)]
    pub push_name: Option<String>,
    /// Plain-text body (conversation, extended text, or media caption).
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub sticker: Option<StickerInfo>,
    pub timestamp: DateTime<Utc>,
    /// Untouched payload as delivered by the bridge.
    #[serde(default)]
    pub raw: serde_json::Value,
}

impl InboundMessage {
    /// Build a text message from `chat`, as used by local tooling and tests.
    pub fn text(chat: Jid, body: &str) -> Self {
        Self {
            id: String::new(),
            chat,
            participant: None,
            from_me: false,
            push_name: None,
            text: Some(body.to_string()),
            sticker: None,
            timestamp: Utc::now(),
            raw: serde_json::Value::Null,
        }
    }

    /// Text body, if present and non-blank.
    pub fn body(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// Presence values the connection can announce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presence {
    Available,
    Unavailable,
    /// Typing indicator in one chat.
    Composing(Jid),
    /// Clears a typing indicator in one chat.
    Paused(Jid),
}

impl Presence {
    /// Wire name used by the bridge.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "available",
            Self::Unavailable => "unavailable",
            Self::Composing(_) => "composing",
            Self::Paused(_) => "paused",
        }
    }
}

/// Connection lifecycle as reported by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    /// Session closed. `logged_out` means the credentials were revoked and
    /// reconnecting is pointless.
    Closed { logged_out: bool },
}

/// Everything the connection reports to the bot.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    Message(Box<InboundMessage>),
    State(ConnectionState),
    /// Pairing QR payload to show to the operator.
    Qr(String),
    /// The transport rotated and saved its credentials.
    CredentialsUpdated,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_detection_by_suffix() {
        assert!(Jid::new("120363001234567890@g.us").is_group());
        assert!(!Jid::new("5511999887766@s.whatsapp.net").is_group());
        assert!(!Jid::new("1234@lid").is_group());
    }

    #[test]
    fn test_parse_requires_at_sign() {
        assert!(Jid::parse("12345").is_none());
        assert!(Jid::parse("   ").is_none());
        assert_eq!(
            Jid::parse(" 12345@s.whatsapp.net ").unwrap().as_str(),
            "12345@s.whatsapp.net"
        );
    }

    #[test]
    fn test_jid_is_case_sensitive() {
        assert_ne!(
            Jid::new("abc@s.whatsapp.net"),
            Jid::new("ABC@s.whatsapp.net")
        );
    }

    #[test]
    fn test_user_part() {
        assert_eq!(Jid::new("5511999@s.whatsapp.net").user(), "5511999");
        assert_eq!(Jid::new("nobody").user(), "nobody");
    }

    #[test]
    fn test_body_skips_blank_text() {
        let jid = Jid::new("1@s.whatsapp.net");
        assert_eq!(InboundMessage::text(jid.clone(), "  ").body(), None);
        assert_eq!(InboundMessage::text(jid, "!ping").body(), Some("!ping"));
    }
}
