mod dispatcher;
mod supervisor;

use clap::{Parser, Subcommand};
use dispatcher::Dispatcher;
use hush_auth::{audit::AuditLogger, AuthStore, RegisterOutcome};
use hush_channels::{evolution::EvolutionChannel, StealthConnection};
use hush_commands::build_registry;
use hush_core::{
    config::{self, shellexpand, Config},
    message::Jid,
    traits::Connection,
};
use std::path::Path;
use std::sync::Arc;
use supervisor::Supervisor;
use tracing::{info, warn};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "hush",
    version,
    about = "hush — stealth WhatsApp command bot"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Connect to WhatsApp and start answering commands.
    Start,
    /// Show configuration, commands, and authorization counts.
    Status,
    /// List authorized users and groups.
    Authorized,
    /// Authorize a user or group without going through chat.
    Register {
        /// Full identity, e.g. 5511999887766@s.whatsapp.net or 1203...@g.us.
        jid: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;
    init_logging(&cfg, matches!(cli.command, Commands::Start));
    if let Some(notice) = missing_config_notice(&cli.config) {
        info!("{notice}");
    }

    match cli.command {
        Commands::Start => start(cfg).await?,
        Commands::Status => status(&cli.config, &cfg).await?,
        Commands::Authorized => {
            let store = AuthStore::load(shellexpand(&cfg.auth.file))?;
            let set = store.snapshot();
            println!("Users ({}):", set.users.len());
            for user in &set.users {
                println!("  {user}");
            }
            println!("Groups ({}):", set.groups.len());
            for group in &set.groups {
                println!("  {group}");
            }
        }
        Commands::Register { jid } => {
            let Some(jid) = Jid::parse(&jid) else {
                anyhow::bail!("invalid identity '{jid}': must include @");
            };
            let store = AuthStore::load(shellexpand(&cfg.auth.file))?;
            let kind = if jid.is_group() { "Group" } else { "User" };
            match store.register(&jid)? {
                RegisterOutcome::Added => println!("{kind} {jid} registered."),
                RegisterOutcome::AlreadyPresent => println!("{kind} {jid} is already registered."),
            }
        }
    }

    Ok(())
}

/// Reported once logging is up, since `config::load` runs before it.
fn missing_config_notice(path: &str) -> Option<String> {
    (!Path::new(path).exists()).then(|| format!("Config file not found at {path}, using defaults"))
}

/// Console logging, plus a daily rolling file under `{data_dir}/logs` for
/// the long-running bot. `RUST_LOG` overrides `[hush] log_level`.
fn init_logging(cfg: &Config, to_file: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.hush.log_level));
    let console = fmt::layer().with_target(false);

    let file = if to_file {
        let log_dir = format!("{}/logs", shellexpand(&cfg.hush.data_dir));
        match std::fs::create_dir_all(&log_dir) {
            Ok(()) => Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(RollingFileAppender::new(Rotation::DAILY, log_dir, "hush.log")),
            ),
            Err(e) => {
                eprintln!("cannot create log directory {log_dir}: {e}");
                None
            }
        }
    } else {
        None
    };

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init();
}

async fn start(cfg: Config) -> anyhow::Result<()> {
    // An unreadable authorization file aborts startup.
    let store = Arc::new(AuthStore::load(shellexpand(&cfg.auth.file))?);

    let evolution = match cfg.channel.evolution {
        Some(ref evo) if evo.enabled => evo.clone(),
        _ => anyhow::bail!(
            "No connection enabled. Enable [channel.evolution] in config.toml."
        ),
    };
    if evolution.api_key.is_empty() {
        anyhow::bail!(
            "Evolution is enabled but api_key is empty. \
             Set it in config.toml or EVOLUTION_API_KEY env var."
        );
    }

    let connection: Arc<dyn Connection> = Arc::new(StealthConnection::new(Arc::new(
        EvolutionChannel::new(evolution),
    )));

    let registry = build_registry(store.clone(), &cfg.commands);
    if registry.is_empty() {
        warn!("no commands enabled, only authorization replies will be sent");
    }

    let mut dispatcher = Dispatcher::new(
        connection.clone(),
        registry,
        store,
        cfg.dispatch.clone(),
    )?;
    if cfg.audit.enabled {
        dispatcher = dispatcher.with_audit(AuditLogger::open(&cfg.audit).await?);
    }
    let supervisor = Supervisor::new(connection.clone(), cfg.connection.clone());

    println!("hush — starting {}...", cfg.hush.name);
    let events = connection
        .start()
        .await
        .map_err(|e| anyhow::anyhow!("failed to start connection {}: {e}", connection.name()))?;

    let result = dispatcher.run(events, &supervisor).await;

    if let Err(e) = connection.stop().await {
        warn!("failed to stop connection: {e}");
    }
    result
}

async fn status(config_path: &str, cfg: &Config) -> anyhow::Result<()> {
    println!("hush — Status Check\n");
    println!("Config: {config_path}");
    println!("Data dir: {}", shellexpand(&cfg.hush.data_dir));
    println!();

    let store = Arc::new(AuthStore::load(shellexpand(&cfg.auth.file))?);
    let set = store.snapshot();
    println!("Authorization file: {}", store.path().display());
    println!(
        "  {} users, {} groups",
        set.users.len(),
        set.groups.len()
    );
    println!();

    println!(
        "Prefixes: {}  |  registration: {}  |  deny: {:?}",
        cfg.dispatch.prefixes.join(" "),
        cfg.dispatch.registration_command,
        cfg.dispatch.deny,
    );
    let registry = build_registry(store, &cfg.commands);
    println!("Commands ({}):", registry.len());
    for name in registry.names() {
        let description = registry
            .resolve(&name)
            .map(|h| h.description().to_string())
            .unwrap_or_default();
        println!("  {name:<14} {description}");
    }
    println!();

    match cfg.channel.evolution {
        Some(ref evo) => println!(
            "  evolution: {} ({} instance '{}', webhook {}:{})",
            if evo.enabled && !evo.api_key.is_empty() {
                "configured"
            } else if evo.enabled {
                "enabled but missing api_key"
            } else {
                "disabled"
            },
            evo.api_url,
            evo.instance,
            evo.webhook_host,
            evo.webhook_port,
        ),
        None => println!("  evolution: not configured"),
    }

    if cfg.audit.enabled {
        let audit = AuditLogger::open(&cfg.audit).await?;
        let recent = audit.recent(5).await?;
        println!();
        println!("Recent commands:");
        for (sender, command, status) in recent {
            println!("  {status:<9} {command:<14} {sender}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_config_notice() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("config.toml");
        let missing = missing.to_str().unwrap();

        let notice = missing_config_notice(missing).unwrap();
        assert!(notice.contains(missing));
        assert!(notice.ends_with("using defaults"));

        std::fs::write(missing, "[hush]\n").unwrap();
        assert!(missing_config_notice(missing).is_none());
    }
}
