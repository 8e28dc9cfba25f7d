//! Turns inbound messages into command invocations.
//!
//! Filters, matches the trigger prefix, enforces authorization (with the
//! registration bypass), runs the handler under an optional deadline, and
//! contains handler failures. Events are handled one at a time.

mod parse;


use parse::parse_invocation;

use crate::supervisor::{Supervisor, Verdict};
use hush_auth::{
    audit::{AuditEntry, AuditLogger, AuditStatus},
    AuthStore,
};
use hush_channels::generate_qr_terminal;
use hush_commands::CommandRegistry;
use hush_core::{
    config::{DenyPolicy, DispatchConfig},
    error::HushError,
    message::{ConnectionEvent, InboundMessage, Jid, Presence},
    traits::{CommandContext, CommandHandler, Connection},
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Terminal state of one inbound message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Not a command, or nothing to do.
    Ignored,
    /// Sender not authorized.
    Denied,
    Executed,
    /// Handler failed or timed out; the failure notice was sent.
    Errored,
}

/// Routes inbound messages to command handlers.
pub struct Dispatcher {
    connection: Arc<dyn Connection>,
    registry: CommandRegistry,
    store: Arc<AuthStore>,
    config: DispatchConfig,
    audit: Option<AuditLogger>,
}

impl Dispatcher {
    /// Fails when the registration command has no handler, since no
    /// unauthorized sender could ever become authorized.
    pub fn new(
        connection: Arc<dyn Connection>,
        registry: CommandRegistry,
        store: Arc<AuthStore>,
        config: DispatchConfig,
    ) -> Result<Self, HushError> {
        let registration = config.registration_command.trim();
        if registration.is_empty() || registry.resolve(registration).is_none() {
            return Err(HushError::Config(format!(
                "registration command '{}' has no handler; enable it in [commands] \
                 or set [dispatch] registration_command to one of: {}",
                config.registration_command,
                registry.names().join(", ")
            )));
        }
        Ok(Self {
            connection,
            registry,
            store,
            config,
            audit: None,
        })
    }

    /// Record every verdict in the audit log.
    pub fn with_audit(mut self, audit: AuditLogger) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Process one inbound message to its terminal state.
    pub async fn handle(&self, message: &InboundMessage) -> Outcome {
        let Some(body) = message.body() else {
            return Outcome::Ignored;
        };
        if message.from_me && !self.config.allow_self {
            debug!("ignoring own message {}", message.id);
            return Outcome::Ignored;
        }
        let Some(invocation) = parse_invocation(body, &self.config.prefixes) else {
            return Outcome::Ignored;
        };

        let sender = &message.chat;
        let is_registration = invocation
            .name
            .eq_ignore_ascii_case(self.config.registration_command.trim());

        if !is_registration && !self.store.is_authorized(sender) {
            info!("denied '{}' from unauthorized {sender}", invocation.name);
            if self.config.deny == DenyPolicy::Notice {
                self.send_best_effort(sender, &self.config.deny_message)
                    .await;
            }
            self.record(sender, &invocation.name, AuditStatus::Denied, None)
                .await;
            return Outcome::Denied;
        }

        let Some(handler) = self.registry.resolve(&invocation.name) else {
            debug!("unknown command '{}' from {sender}", invocation.name);
            if !self.config.unknown_notice.is_empty() {
                self.send_best_effort(sender, &self.config.unknown_notice)
                    .await;
            }
            return Outcome::Ignored;
        };

        let ctx = CommandContext {
            connection: self.connection.as_ref(),
            sender,
            args: &invocation.args,
            message,
            prefix: invocation.prefix,
        };
        let result = self.invoke(handler.as_ref(), &ctx).await;

        // Runs on every path once the handler has resolved.
        self.announce_unavailable().await;

        match result {
            Ok(()) => {
                info!("executed '{}' for {sender}", invocation.name);
                self.record(sender, &invocation.name, AuditStatus::Executed, None)
                    .await;
                Outcome::Executed
            }
            Err(e) => {
                error!("command '{}' failed for {sender}: {e}", invocation.name);
                self.send_best_effort(sender, &self.config.failure_message)
                    .await;
                self.record(
                    sender,
                    &invocation.name,
                    AuditStatus::Errored,
                    Some(e.to_string()),
                )
                .await;
                Outcome::Errored
            }
        }
    }

    /// Run the handler, bounded by the configured deadline.
    async fn invoke(
        &self,
        handler: &dyn CommandHandler,
        ctx: &CommandContext<'_>,
    ) -> Result<(), HushError> {
        match self.config.handler_timeout() {
            Some(deadline) => tokio::time::timeout(deadline, handler.execute(ctx))
                .await
                .unwrap_or_else(|_| {
                    Err(HushError::Handler(format!(
                        "'{}' timed out after {}s",
                        handler.name(),
                        deadline.as_secs()
                    )))
                }),
            None => handler.execute(ctx).await,
        }
    }

    async fn announce_unavailable(&self) {
        if let Err(e) = self.connection.send_presence(Presence::Unavailable).await {
            warn!("failed to announce unavailable presence: {e}");
        }
    }

    async fn send_best_effort(&self, to: &Jid, text: &str) {
        if let Err(e) = self.connection.send_text(to, text).await {
            warn!("failed to send reply to {to}: {e}");
        }
    }

    async fn record(&self, sender: &Jid, command: &str, status: AuditStatus, detail: Option<String>) {
        let Some(ref audit) = self.audit else {
            return;
        };
        let entry = AuditEntry {
            sender: sender.to_string(),
            command: command.to_string(),
            status,
            detail,
        };
        if let Err(e) = audit.log(&entry).await {
            warn!("audit log write failed: {e}");
        }
    }

    /// Drive the connection's event stream until Ctrl-C, the stream ends, or
    /// the session is logged out.
    pub async fn run(
        &self,
        mut events: mpsc::Receiver<ConnectionEvent>,
        supervisor: &Supervisor,
    ) -> anyhow::Result<()> {
        info!(
            "hush dispatcher running | connection: {} | commands: {} | prefixes: {}",
            self.connection.name(),
            self.registry.names().join(", "),
            self.config.prefixes.join(" "),
        );

        loop {
            tokio::select! {
                event = events.recv() => {
                    let Some(event) = event else {
                        info!("connection event stream ended");
                        break;
                    };
                    if self.on_event(event, supervisor).await == Verdict::Stop {
                        anyhow::bail!("WhatsApp session logged out; pair again to continue");
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        Ok(())
    }

    async fn on_event(&self, event: ConnectionEvent, supervisor: &Supervisor) -> Verdict {
        match event {
            ConnectionEvent::Message(message) => {
                let outcome = self.handle(&message).await;
                debug!("message {} → {outcome:?}", message.id);
                Verdict::Continue
            }
            ConnectionEvent::State(state) => supervisor.on_state(state).await,
            ConnectionEvent::Qr(code) => {
                match generate_qr_terminal(&code) {
                    Ok(qr) => {
                        info!("pairing QR received, scan it with WhatsApp");
                        println!("\n{qr}");
                    }
                    Err(e) => warn!("could not render pairing QR: {e}"),
                }
                Verdict::Continue
            }
            ConnectionEvent::CredentialsUpdated => {
                info!("credentials updated by the bridge");
                Verdict::Continue
            }
        }
    }
}
