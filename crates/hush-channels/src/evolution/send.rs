//! Outbound REST calls: chunking and retry.

use hush_core::error::HushError;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, warn};

/// Retry delays for exponential backoff: 500ms, 1s, 2s.
pub(super) const RETRY_DELAYS_MS: [u64; 3] = [500, 1000, 2000];

/// Longest text sent in one message; longer replies are split.
pub(super) const MAX_MESSAGE_LEN: usize = 4096;

/// POST `body` to a bridge endpoint, retrying failed attempts.
///
/// Transport errors and non-2xx responses both count as failures. Returns
/// the decoded JSON response (or `Value::Null` for an empty body).
pub(super) async fn retry_send<B: Serialize + ?Sized>(
    http: &reqwest::Client,
    url: &str,
    api_key: &str,
    body: &B,
) -> Result<Value, HushError> {
    let mut last_err = String::new();

    for (attempt, delay_ms) in RETRY_DELAYS_MS.iter().enumerate() {
        match post_once(http, url, api_key, body).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                let attempt_num = attempt + 1;
                if attempt_num < RETRY_DELAYS_MS.len() {
                    warn!(
                        "evolution request attempt {attempt_num}/{} failed: {e}, retrying in {delay_ms}ms",
                        RETRY_DELAYS_MS.len()
                    );
                    tokio::time::sleep(std::time::Duration::from_millis(*delay_ms)).await;
                } else {
                    error!(
                        "evolution request attempt {attempt_num}/{} failed: {e}, giving up",
                        RETRY_DELAYS_MS.len()
                    );
                }
                last_err = e;
            }
        }
    }

    Err(HushError::Channel(format!(
        "evolution request to {url} failed after {} attempts: {last_err}",
        RETRY_DELAYS_MS.len()
    )))
}

async fn post_once<B: Serialize + ?Sized>(
    http: &reqwest::Client,
    url: &str,
    api_key: &str,
    body: &B,
) -> Result<Value, String> {
    let resp = http
        .post(url)
        .header("apikey", api_key)
        .json(body)
        .send()
        .await
        .map_err(|e| e.to_string())?;

    let status = resp.status();
    let text = resp.text().await.map_err(|e| e.to_string())?;
    if !status.is_success() {
        return Err(format!("HTTP {status}: {text}"));
    }
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(|e| format!("invalid response body: {e}"))
}

/// Split a long message into chunks of at most `max_len` bytes,
/// preferring to break after a newline.
pub(super) fn split_message(text: &str, max_len: usize) -> Vec<&str> {
    if text.len() <= max_len {
        return vec![text];
    }

    let mut chunks = Vec::new();
    let mut start = 0;

    while start < text.len() {
        let mut end = (start + max_len).min(text.len());
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        if end == start {
            end = start + text[start..].chars().next().map_or(1, char::len_utf8);
        }
        let break_at = if end < text.len() {
            text[start..end]
                .rfind('\n')
                .map(|i| start + i + 1)
                .unwrap_or(end)
        } else {
            end
        };
        chunks.push(&text[start..break_at]);
        start = break_at;
    }

    chunks
}
