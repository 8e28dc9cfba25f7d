//! Local webhook listener the bridge posts events to.

use super::events::parse_webhook;
use super::SentIds;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, Path, State},
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::post,
    Router,
};
use hush_core::message::ConnectionEvent;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

/// Media payloads can be inlined as base64.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Shared state for webhook handlers.
#[derive(Clone)]
pub(super) struct WebhookState {
    pub tx: mpsc::Sender<ConnectionEvent>,
    pub sent_ids: Arc<Mutex<SentIds>>,
    /// Expected `apikey`; `None` accepts every call.
    pub token: Option<String>,
    pub instance: String,
}

type Reply = (StatusCode, Json<Value>);

/// Constant-time string comparison for the shared secret.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}

/// The bridge sends its key in the `apikey` header, and also in the body.
fn authorized(state: &WebhookState, headers: &HeaderMap, body: &Value) -> bool {
    let Some(ref expected) = state.token else {
        return true;
    };
    let header = headers.get("apikey").and_then(|h| h.to_str().ok());
    let field = body["apikey"].as_str();
    header
        .into_iter()
        .chain(field)
        .any(|given| constant_time_eq(given, expected))
}

/// Build the axum router with shared state.
pub(super) fn build_router(state: WebhookState) -> Router {
    Router::new()
        .route("/webhook", post(receive))
        .route("/webhook/{event}", post(receive_event))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// `POST /webhook`: event name carried in the body.
async fn receive(
    headers: HeaderMap,
    State(state): State<WebhookState>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Reply, Reply> {
    ingest(&state, &headers, None, body).await
}

/// `POST /webhook/{event}`: bridge configured with per-event URLs.
async fn receive_event(
    headers: HeaderMap,
    State(state): State<WebhookState>,
    Path(event): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Reply, Reply> {
    ingest(&state, &headers, Some(&event), body).await
}

async fn ingest(
    state: &WebhookState,
    headers: &HeaderMap,
    path_event: Option<&str>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Reply, Reply> {
    let Json(body) = body.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": format!("invalid request: {e}")})),
        )
    })?;

    if !authorized(state, headers, &body) {
        warn!("rejected webhook call with bad apikey");
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({"error": "invalid apikey"})),
        ));
    }

    if let Some(instance) = body["instance"].as_str() {
        if instance != state.instance {
            debug!("ignoring webhook for foreign instance '{instance}'");
            return Ok((StatusCode::OK, Json(json!({"status": "ignored"}))));
        }
    }

    let mut forwarded = 0usize;
    for event in parse_webhook(&body, path_event) {
        if let ConnectionEvent::Message(ref msg) = event {
            if msg.from_me && state.sent_ids.lock().await.remove(&msg.id) {
                debug!("skipping own echo: {}", msg.id);
                continue;
            }
        }
        if state.tx.send(event).await.is_err() {
            info!("evolution event receiver dropped");
            break;
        }
        forwarded += 1;
    }

    Ok((
        StatusCode::OK,
        Json(json!({"status": "ok", "events": forwarded})),
    ))
}
