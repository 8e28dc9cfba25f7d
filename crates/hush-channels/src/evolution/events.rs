//! Webhook payload translation: Evolution events → `ConnectionEvent`s.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use hush_core::message::{
    ConnectionEvent, ConnectionState, InboundMessage, Jid, StickerInfo,
};
use serde_json::Value;
use tracing::debug;

/// Baileys disconnect reason for a revoked session.
const LOGGED_OUT_STATUS: u64 = 401;

/// Wrapper message types whose payload sits under `.message`.
const WRAPPERS: [&str; 5] = [
    "ephemeralMessage",
    "viewOnceMessage",
    "viewOnceMessageV2",
    "viewOnceMessageV2Extension",
    "documentWithCaptionMessage",
];

/// Canonical event name: `MESSAGES_UPSERT`, `messages-upsert` and
/// `messages.upsert` all become `messages.upsert`.
pub(super) fn normalize_event(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace(['_', '-'], ".")
}

/// Translate one webhook body into connection events.
///
/// `path_event` is the event name taken from `/webhook/{event}`; the body's
/// own `event` field wins when both are present.
pub fn parse_webhook(body: &Value, path_event: Option<&str>) -> Vec<ConnectionEvent> {
    let event = body["event"]
        .as_str()
        .filter(|e| !e.is_empty())
        .or(path_event)
        .map(normalize_event)
        .unwrap_or_default();
    let data = &body["data"];

    match event.as_str() {
        "messages.upsert" => message_items(data)
            .into_iter()
            .filter_map(parse_message)
            .map(|m| ConnectionEvent::Message(Box::new(m)))
            .collect(),
        "connection.update" => parse_connection_state(data)
            .map(ConnectionEvent::State)
            .into_iter()
            .collect(),
        "logout.instance" => vec![ConnectionEvent::State(ConnectionState::Closed {
            logged_out: true,
        })],
        "qrcode.updated" => parse_qr(data).map(ConnectionEvent::Qr).into_iter().collect(),
        "creds.update" => vec![ConnectionEvent::CredentialsUpdated],
        "" => {
            debug!("evolution webhook without event name");
            Vec::new()
        }
        other => {
            debug!("ignoring evolution event '{other}'");
            Vec::new()
        }
    }
}

/// `data` is a single message, an array of them, or `{ messages: [...] }`.
fn message_items(data: &Value) -> Vec<&Value> {
    if let Some(items) = data.as_array() {
        return items.iter().collect();
    }
    if let Some(items) = data["messages"].as_array() {
        return items.iter().collect();
    }
    if data.is_object() {
        return vec![data];
    }
    Vec::new()
}

fn parse_connection_state(data: &Value) -> Option<ConnectionState> {
    let state = data["state"]
        .as_str()
        .or_else(|| data["connection"].as_str())?;
    match state {
        "open" | "connected" => Some(ConnectionState::Open),
        "connecting" => Some(ConnectionState::Connecting),
        "close" | "closed" => {
            let reason = data["statusReason"]
                .as_u64()
                .or_else(|| data["statusReason"].as_str()?.parse().ok());
            Some(ConnectionState::Closed {
                logged_out: reason == Some(LOGGED_OUT_STATUS),
            })
        }
        other => {
            debug!("unknown evolution connection state '{other}'");
            None
        }
    }
}

/// Raw QR payload (not the rendered base64 image).
fn parse_qr(data: &Value) -> Option<String> {
    data["qrcode"]["code"]
        .as_str()
        .or_else(|| data["code"].as_str())
        .filter(|c| !c.is_empty())
        .map(str::to_string)
}

/// Build an inbound message from one `messages.upsert` item.
pub(super) fn parse_message(item: &Value) -> Option<InboundMessage> {
    let key = &item["key"];
    let chat = key["remoteJid"].as_str().filter(|j| !j.is_empty())?;
    if chat == "status@broadcast" {
        debug!("skipping status broadcast");
        return None;
    }

    let content = unwrap_message(&item["message"]);
    let text = content["conversation"]
        .as_str()
        .or_else(|| content["extendedTextMessage"]["text"].as_str())
        .or_else(|| content["imageMessage"]["caption"].as_str())
        .or_else(|| content["videoMessage"]["caption"].as_str())
        .or_else(|| content["documentMessage"]["caption"].as_str())
        .map(str::to_string);

    let sticker = parse_sticker(content).or_else(|| {
        quoted_message(content, item)
            .map(unwrap_message)
            .and_then(parse_sticker)
    });

    Some(InboundMessage {
        id: key["id"].as_str().unwrap_or_default().to_string(),
        chat: Jid::new(chat),
        participant: key["participant"]
            .as_str()
            .filter(|p| !p.is_empty())
            .map(Jid::new),
        from_me: key["fromMe"].as_bool().unwrap_or(false),
        push_name: item["pushName"]
            .as_str()
            .filter(|n| !n.is_empty())
            .map(str::to_string),
        text,
        sticker,
        timestamp: parse_timestamp(&item["messageTimestamp"]),
        raw: item.clone(),
    })
}

fn parse_sticker(content: &Value) -> Option<StickerInfo> {
    let s = content.get("stickerMessage")?;
    let file_sha256 = decode_bytes(&s["fileSha256"]);
    let file_enc_sha256 = decode_bytes(&s["fileEncSha256"]);
    if file_sha256.is_none() && file_enc_sha256.is_none() {
        return None;
    }
    Some(StickerInfo {
        file_sha256: file_sha256.unwrap_or_default(),
        file_enc_sha256: file_enc_sha256.unwrap_or_default(),
    })
}

/// The message a reply quotes. WhatsApp puts `contextInfo` on the content
/// message; the bridge may also lift it to the item.
fn quoted_message<'a>(content: &'a Value, item: &'a Value) -> Option<&'a Value> {
    let from_content = content.as_object().into_iter().flat_map(|m| m.values());
    from_content
        .map(|inner| &inner["contextInfo"]["quotedMessage"])
        .chain(std::iter::once(&item["contextInfo"]["quotedMessage"]))
        .find(|quoted| quoted.is_object())
}

/// Peel wrapper layers until the content message is reached.
fn unwrap_message(message: &Value) -> &Value {
    let mut current = message;
    'outer: loop {
        for wrapper in WRAPPERS {
            let inner = &current[wrapper]["message"];
            if inner.is_object() {
                current = inner;
                continue 'outer;
            }
        }
        return current;
    }
}

/// Seconds since the epoch as a number, numeric string, or protobuf Long.
fn parse_timestamp(value: &Value) -> DateTime<Utc> {
    let secs = value
        .as_i64()
        .or_else(|| value.as_str()?.parse().ok())
        .or_else(|| value["low"].as_i64());
    secs.and_then(|s| DateTime::from_timestamp(s, 0))
        .unwrap_or_else(Utc::now)
}

/// Bytes serialized by the bridge: a base64 string, a number array, a Node
/// `Buffer` (`{"type":"Buffer","data":[...]}`), or an index map `{"0":..}`.
pub(super) fn decode_bytes(value: &Value) -> Option<Vec<u8>> {
    match value {
        Value::String(s) => BASE64.decode(s.trim()).ok(),
        Value::Array(items) => items
            .iter()
            .map(|v| v.as_u64().and_then(|n| u8::try_from(n).ok()))
            .collect(),
        Value::Object(map) => {
            if let Some(data) = map.get("data").filter(|d| d.is_array()) {
                return decode_bytes(data);
            }
            let mut indexed = map
                .iter()
                .map(|(k, v)| {
                    let idx = k.parse::<usize>().ok()?;
                    let byte = v.as_u64().and_then(|n| u8::try_from(n).ok())?;
                    Some((idx, byte))
                })
                .collect::<Option<Vec<_>>>()?;
            if indexed.is_empty() {
                return None;
            }
            indexed.sort_unstable_by_key(|(idx, _)| *idx);
            Some(indexed.into_iter().map(|(_, b)| b).collect())
        }
        _ => None,
    }
}
