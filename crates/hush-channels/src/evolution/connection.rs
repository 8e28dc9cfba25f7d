//! Connection trait implementation for the Evolution bridge.

use super::send::{retry_send, split_message, MAX_MESSAGE_LEN};
use super::types::{
    ChatPresenceRequest, ConnectResponse, PresenceRequest, SendTextRequest, SendTextResponse,
    SettingsRequest,
};
use super::webhook::{build_router, WebhookState};
use super::EvolutionChannel;
use async_trait::async_trait;
use hush_core::{
    error::HushError,
    message::{ConnectionEvent, ConnectionState, Jid, Presence},
    traits::Connection,
};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

impl EvolutionChannel {
    /// Bind the webhook listener and serve it in the background.
    async fn spawn_webhook(&self, tx: mpsc::Sender<ConnectionEvent>) -> Result<(), HushError> {
        let token = if self.config.webhook_token.is_empty() {
            None
        } else {
            Some(self.config.webhook_token.clone())
        };
        let state = WebhookState {
            tx,
            sent_ids: self.sent_ids.clone(),
            token,
            instance: self.config.instance.clone(),
        };

        let addr = format!("{}:{}", self.config.webhook_host, self.config.webhook_port);
        let listener = tokio::net::TcpListener::bind(&addr).await.map_err(|e| {
            HushError::Channel(format!("webhook listener failed to bind to {addr}: {e}"))
        })?;
        info!("evolution webhook listening on {addr}");

        let app = build_router(state);
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("evolution webhook server error: {e}");
            }
        });
        *self.server.lock().await = Some(handle);
        Ok(())
    }

    /// Turn off online presence and read receipts on the instance.
    async fn apply_stealth_settings(&self) -> Result<(), HushError> {
        retry_send(
            &self.http,
            &self.endpoint("settings/set"),
            &self.config.api_key,
            &SettingsRequest::stealth(),
        )
        .await?;
        debug!("evolution instance settings applied");
        Ok(())
    }

    /// Ask the bridge to (re)open the session. Reports a pairing code or an
    /// already-open session as events.
    async fn connect_instance(&self) -> Result<(), HushError> {
        let url = self.endpoint("instance/connect");
        let resp = self
            .http
            .get(&url)
            .header("apikey", &self.config.api_key)
            .send()
            .await
            .map_err(|e| HushError::Channel(format!("evolution connect failed: {e}")))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| HushError::Channel(format!("evolution connect failed: {e}")))?;
        if !status.is_success() {
            return Err(HushError::Channel(format!(
                "evolution connect failed (HTTP {status}): {text}"
            )));
        }

        let body: ConnectResponse = serde_json::from_str(&text).unwrap_or_default();
        if let Some(code) = body.code.filter(|c| !c.is_empty()) {
            self.emit(ConnectionEvent::Qr(code)).await;
        } else if body.instance.is_some_and(|i| i.state == "open") {
            self.emit(ConnectionEvent::State(ConnectionState::Open)).await;
        } else {
            self.emit(ConnectionEvent::State(ConnectionState::Connecting))
                .await;
        }
        Ok(())
    }
}

#[async_trait]
impl Connection for EvolutionChannel {
    fn name(&self) -> &str {
        "evolution"
    }

    async fn start(&self) -> Result<mpsc::Receiver<ConnectionEvent>, HushError> {
        let (tx, rx) = mpsc::channel(64);
        *self.events_tx.lock().await = Some(tx.clone());
        self.spawn_webhook(tx).await?;

        if let Err(e) = self.apply_stealth_settings().await {
            warn!("could not apply stealth settings: {e}");
        }

        // A bridge that is down at startup is handled like a dropped session.
        if let Err(e) = self.connect_instance().await {
            warn!("{e}");
            self.emit(ConnectionEvent::State(ConnectionState::Closed {
                logged_out: false,
            }))
            .await;
        }

        info!("evolution channel started (instance '{}')", self.config.instance);
        Ok(rx)
    }

    async fn reconnect(&self) -> Result<(), HushError> {
        self.connect_instance().await
    }

    async fn send_text(&self, to: &Jid, text: &str) -> Result<(), HushError> {
        let url = self.endpoint("message/sendText");
        for chunk in split_message(text, MAX_MESSAGE_LEN) {
            let body = SendTextRequest {
                number: to.as_str(),
                text: chunk,
            };
            let resp = retry_send(&self.http, &url, &self.config.api_key, &body).await?;
            let sent: SendTextResponse = serde_json::from_value(resp).unwrap_or_default();
            if let Some(id) = sent.key.and_then(|k| k.id) {
                self.sent_ids.lock().await.insert(id);
            }
        }
        Ok(())
    }

    async fn send_presence(&self, presence: Presence) -> Result<(), HushError> {
        match presence {
            Presence::Available | Presence::Unavailable => {
                let body = PresenceRequest {
                    presence: presence.as_str(),
                };
                retry_send(
                    &self.http,
                    &self.endpoint("instance/setPresence"),
                    &self.config.api_key,
                    &body,
                )
                .await?;
            }
            Presence::Composing(ref chat) | Presence::Paused(ref chat) => {
                let body = ChatPresenceRequest {
                    number: chat.as_str(),
                    presence: presence.as_str(),
                    delay: 0,
                };
                retry_send(
                    &self.http,
                    &self.endpoint("chat/sendPresence"),
                    &self.config.api_key,
                    &body,
                )
                .await?;
            }
        }
        debug!("presence '{}' sent", presence.as_str());
        Ok(())
    }

    async fn stop(&self) -> Result<(), HushError> {
        if let Some(handle) = self.server.lock().await.take() {
            handle.abort();
        }
        *self.events_tx.lock().await = None;
        info!("evolution channel stopped");
        Ok(())
    }
}
