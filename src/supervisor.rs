//! Connection supervision: reconnect scheduling and presence on open.

use hush_core::{
    config::ConnectionConfig,
    message::{ConnectionState, Presence},
    traits::Connection,
};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Whether the event loop should keep going after a state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Continue,
    Stop,
}

/// Reacts to connection state changes.
///
/// At most one reconnect is pending at a time. Consecutive failures grow the
/// delay per `[connection]`; a successful open resets it.
#[derive(Clone)]
pub struct Supervisor {
    connection: Arc<dyn Connection>,
    config: ConnectionConfig,
    attempt: Arc<AtomicU32>,
    pending: Arc<AtomicBool>,
}

impl Supervisor {
    pub fn new(connection: Arc<dyn Connection>, config: ConnectionConfig) -> Self {
        Self {
            connection,
            config,
            attempt: Arc::new(AtomicU32::new(0)),
            pending: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn on_state(&self, state: ConnectionState) -> Verdict {
        match state {
            ConnectionState::Open => {
                self.attempt.store(0, Ordering::SeqCst);
                info!("connection open");
                if let Err(e) = self.connection.send_presence(Presence::Unavailable).await {
                    warn!("failed to announce unavailable presence: {e}");
                }
                Verdict::Continue
            }
            ConnectionState::Connecting => {
                debug!("connecting");
                Verdict::Continue
            }
            ConnectionState::Closed { logged_out: true } => {
                error!("connection closed: logged out, not reconnecting");
                Verdict::Stop
            }
            ConnectionState::Closed { logged_out: false } => {
                if self.pending.swap(true, Ordering::SeqCst) {
                    debug!("connection closed, reconnect already scheduled");
                } else {
                    self.schedule_reconnect();
                }
                Verdict::Continue
            }
        }
    }

    /// Spawn one delayed reconnect. A failed attempt schedules the next one.
    fn schedule_reconnect(&self) {
        let attempt = self.attempt.fetch_add(1, Ordering::SeqCst) + 1;
        let delay = self.config.reconnect_delay(attempt);
        warn!(
            "connection closed, reconnecting in {}s (attempt {attempt})",
            delay.as_secs()
        );

        let this = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            match this.connection.reconnect().await {
                Ok(()) => {
                    this.pending.store(false, Ordering::SeqCst);
                    info!("reconnect attempt {attempt} issued");
                }
                Err(e) => {
                    warn!("reconnect attempt {attempt} failed: {e}");
                    this.schedule_reconnect();
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use hush_core::{
        config::BackoffMode,
        error::HushError,
        message::{ConnectionEvent, Jid},
    };
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[derive(Default)]
    struct FlakyConnection {
        reconnects: Mutex<u32>,
        /// Reconnect calls that fail before one succeeds.
        failures: Mutex<u32>,
        presences: Mutex<Vec<Presence>>,
    }

    #[async_trait]
    impl Connection for FlakyConnection {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn start(&self) -> Result<mpsc::Receiver<ConnectionEvent>, HushError> {
            let (_tx, rx) = mpsc::channel(1);
            Ok(rx)
        }

        async fn reconnect(&self) -> Result<(), HushError> {
            *self.reconnects.lock().unwrap() += 1;
            let mut failures = self.failures.lock().unwrap();
            if *failures > 0 {
                *failures -= 1;
                return Err(HushError::Channel("bridge unreachable".into()));
            }
            Ok(())
        }

        async fn send_text(&self, _to: &Jid, _text: &str) -> Result<(), HushError> {
            Ok(())
        }

        async fn send_presence(&self, presence: Presence) -> Result<(), HushError> {
            self.presences.lock().unwrap().push(presence);
            Ok(())
        }

        async fn stop(&self) -> Result<(), HushError> {
            Ok(())
        }
    }

    fn config(backoff: BackoffMode) -> ConnectionConfig {
        ConnectionConfig {
            reconnect_delay_secs: 3,
            reconnect_max_delay_secs: 60,
            backoff,
        }
    }

    fn reconnects(conn: &FlakyConnection) -> u32 {
        *conn.reconnects.lock().unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_close_schedules_one_reconnect() {
        let conn = Arc::new(FlakyConnection::default());
        let sup = Supervisor::new(conn.clone(), config(BackoffMode::Fixed));

        let verdict = sup
            .on_state(ConnectionState::Closed { logged_out: false })
            .await;
        assert_eq!(verdict, Verdict::Continue);
        assert_eq!(reconnects(&conn), 0, "reconnect must wait for the delay");

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(reconnects(&conn), 0);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(reconnects(&conn), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(reconnects(&conn), 1, "exactly one attempt per close");
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_close_while_pending() {
        let conn = Arc::new(FlakyConnection::default());
        let sup = Supervisor::new(conn.clone(), config(BackoffMode::Fixed));

        sup.on_state(ConnectionState::Closed { logged_out: false }).await;
        sup.on_state(ConnectionState::Closed { logged_out: false }).await;
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(reconnects(&conn), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_logged_out_stops_without_retry() {
        let conn = Arc::new(FlakyConnection::default());
        let sup = Supervisor::new(conn.clone(), config(BackoffMode::Fixed));

        let verdict = sup
            .on_state(ConnectionState::Closed { logged_out: true })
            .await;
        assert_eq!(verdict, Verdict::Stop);
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(reconnects(&conn), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_reconnect_backs_off() {
        let conn = Arc::new(FlakyConnection::default());
        *conn.failures.lock().unwrap() = 2;
        let sup = Supervisor::new(conn.clone(), config(BackoffMode::Exponential));

        sup.on_state(ConnectionState::Closed { logged_out: false }).await;
        // Attempts fire at 3s, then +6s, then +12s.
        tokio::time::sleep(Duration::from_millis(3_100)).await;
        assert_eq!(reconnects(&conn), 1);
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(reconnects(&conn), 2);
        tokio::time::sleep(Duration::from_secs(12)).await;
        assert_eq!(reconnects(&conn), 3);
        assert_eq!(sup.attempt.load(Ordering::SeqCst), 3);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(reconnects(&conn), 3, "success ends the retry chain");
    }

    #[tokio::test]
    async fn test_open_resets_attempts_and_hides_presence() {
        let conn = Arc::new(FlakyConnection::default());
        let sup = Supervisor::new(conn.clone(), config(BackoffMode::Exponential));
        sup.attempt.store(4, Ordering::SeqCst);

        let verdict = sup.on_state(ConnectionState::Open).await;
        assert_eq!(verdict, Verdict::Continue);
        assert_eq!(sup.attempt.load(Ordering::SeqCst), 0);
        assert_eq!(*conn.presences.lock().unwrap(), vec![Presence::Unavailable]);
    }
}
