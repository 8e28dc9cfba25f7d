mod channels;
mod defaults;


pub use channels::*;

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::debug;

use crate::error::HushError;
use defaults::*;

/// Top-level hush configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub hush: HushConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub commands: CommandsConfig,
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub channel: ChannelConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

/// General bot settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HushConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for HushConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

/// Authorization store location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// JSON file holding the authorized users and groups.
    #[serde(default = "default_auth_file")]
    pub file: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            file: default_auth_file(),
        }
    }
}

/// What to do when an unauthorized sender invokes a command.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DenyPolicy {
    /// Drop the command without a reply.
    Silent,
    /// Reply once with `deny_message`.
    #[default]
    Notice,
}

/// Command dispatch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchConfig {
    /// Leading strings that mark a message as a command.
    #[serde(default = "default_prefixes")]
    pub prefixes: Vec<String>,
    /// Command reachable by unauthorized senders.
    #[serde(default = "default_registration_command")]
    pub registration_command: String,
    /// Process messages sent by the bot's own account.
    #[serde(default)]
    pub allow_self: bool,
    #[serde(default)]
    pub deny: DenyPolicy,
    #[serde(default = "default_deny_message")]
    pub deny_message: String,
    /// Reply for unknown commands. Empty = ignore them.
    #[serde(default)]
    pub unknown_notice: String,
    /// Generic reply when a handler fails.
    #[serde(default = "default_failure_message")]
    pub failure_message: String,
    /// Deadline for a single handler run. 0 = none.
    #[serde(default = "default_handler_timeout_secs")]
    pub handler_timeout_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            prefixes: default_prefixes(),
            registration_command: default_registration_command(),
            allow_self: false,
            deny: DenyPolicy::default(),
            deny_message: default_deny_message(),
            unknown_notice: String::new(),
            failure_message: default_failure_message(),
            handler_timeout_secs: default_handler_timeout_secs(),
        }
    }
}

impl DispatchConfig {
    /// Handler deadline, if one is configured.
    pub fn handler_timeout(&self) -> Option<Duration> {
        (self.handler_timeout_secs > 0).then(|| Duration::from_secs(self.handler_timeout_secs))
    }
}

/// Which built-in commands to register.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommandsConfig {
    /// Command names to enable. Empty = all built-ins.
    #[serde(default)]
    pub enabled: Vec<String>,
}

impl CommandsConfig {
    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.is_empty() || self.enabled.iter().any(|n| n.eq_ignore_ascii_case(name))
    }
}

/// How the reconnect delay evolves across consecutive failures.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackoffMode {
    /// Always wait `reconnect_delay_secs`.
    Fixed,
    /// Double per consecutive failure, capped at `reconnect_max_delay_secs`.
    #[default]
    Exponential,
}

/// Floor for the reconnect delay; a bridge that is down must not be polled
/// in a tight loop.
pub const MIN_RECONNECT_DELAY_SECS: u64 = 1;

/// Reconnect policy for transient disconnects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_reconnect_delay_secs")]
    pub reconnect_delay_secs: u64,
    #[serde(default = "default_reconnect_max_delay_secs")]
    pub reconnect_max_delay_secs: u64,
    #[serde(default)]
    pub backoff: BackoffMode,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_secs: default_reconnect_delay_secs(),
            reconnect_max_delay_secs: default_reconnect_max_delay_secs(),
            backoff: BackoffMode::default(),
        }
    }
}

impl ConnectionConfig {
    /// Delay before reconnect attempt number `attempt` (1-based). Never
    /// below `MIN_RECONNECT_DELAY_SECS`.
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        let base = self.reconnect_delay_secs.max(MIN_RECONNECT_DELAY_SECS);
        let secs = match self.backoff {
            BackoffMode::Fixed => base,
            BackoffMode::Exponential => {
                let shift = attempt.saturating_sub(1).min(32);
                base.saturating_mul(1u64 << shift)
                    .min(self.reconnect_max_delay_secs.max(base))
            }
        };
        Duration::from_secs(secs)
    }
}

/// Audit log config.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_audit_db_path")]
    pub db_path: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            db_path: default_audit_db_path(),
        }
    }
}

/// Expand `~` to home directory.
pub fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = std::env::var_os("HOME") {
            return format!("{}/{rest}", home.to_string_lossy());
        }
    }
    path.to_string()
}

/// Fill secrets left empty in the file from the environment.
fn apply_env_overrides(config: &mut Config) {
    if let Some(ref mut evo) = config.channel.evolution {
        if evo.api_key.is_empty() {
            if let Ok(key) = std::env::var("EVOLUTION_API_KEY") {
                debug!("evolution api_key taken from EVOLUTION_API_KEY");
                evo.api_key = key;
            }
        }
    }
}

/// Load configuration from a TOML file.
///
/// Falls back to defaults if the file does not exist. Nothing is logged
/// here since logging is configured from the result.
pub fn load(path: &str) -> Result<Config, HushError> {
    let path = Path::new(path);
    if !path.exists() {
        let mut config = Config {
            channel: ChannelConfig {
                evolution: Some(EvolutionConfig::default()),
            },
            ..Default::default()
        };
        apply_env_overrides(&mut config);
        return Ok(config);
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| HushError::Config(format!("failed to read {}: {}", path.display(), e)))?;

    let mut config: Config = toml::from_str(&content)
        .map_err(|e| HushError::Config(format!("failed to parse config: {}", e)))?;

    if config.dispatch.prefixes.iter().all(|p| p.is_empty()) {
        return Err(HushError::Config(
            "dispatch.prefixes must contain at least one non-empty prefix".into(),
        ));
    }

    apply_env_overrides(&mut config);
    Ok(config)
}
