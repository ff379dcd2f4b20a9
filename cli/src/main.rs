//! visitor-gate: CLI server
//!
//! Headless visitor management service suitable for deployment as a
//! systemd service, Docker container, or standalone process.
//!
//! ```sh
//! # Run with default config (~/.config/visitor-gate/config.toml)
//! visitor-gate
//!
//! # Custom config path
//! visitor-gate --config /etc/visitor-gate/config.toml
//!
//! # Override the listen port
//! visitor-gate --port 8080
//!
//! # Validate config without starting
//! visitor-gate --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};

use visitor_gate::config::{AppConfig, ConfigError};
use visitor_gate::server::{init_tracing, ServerHandle, ServerOptions};

/// Visitor registration at the gate with owner approval by email.
#[derive(Parser, Debug)]
#[command(
    name = "visitor-gate",
    version,
    about = "Visitor registration with owner approval by email",
    long_about = "visitor-gate: REST API server for recording visitors at the gate, \
                  emailing one-time approval links to residents and reporting to administrators.\n\n\
                  Default config: ~/.config/visitor-gate/config.toml"
)]
struct Cli {
    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "VISITOR_GATE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the REST API listen port.
    #[arg(short, long)]
    port: Option<u16>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Validate the configuration file and exit without starting the server.
    #[arg(long)]
    check: bool,

    /// Skip database migrations on startup.
    #[arg(long)]
    no_migrate: bool,
}

/// A missing file means "run on defaults"; anything else is fatal.
fn load_config(path: &std::path::Path) -> Result<(AppConfig, bool), ConfigError> {
    match AppConfig::load(path) {
        Ok(config) => Ok((config, true)),
        Err(ConfigError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
            let mut config = AppConfig::default();
            config.apply_env_overrides(|key| std::env::var(key).ok());
            config.validate()?;
            Ok((config, false))
        }
        Err(e) => Err(e),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli.config.unwrap_or_else(visitor_gate::default_config_path);
    let (mut config, from_file) = load_config(&config_path)?;

    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    init_tracing(&config);

    if from_file {
        info!("Configuration loaded from {}", config_path.display());
    } else {
        warn!("No config file at {}, using defaults", config_path.display());
    }
    if let Some(ref level) = cli.log_level {
        info!("CLI override: log_level = {}", level);
    }

    // ── Apply CLI overrides ────────────────────────────────────
    if let Some(port) = cli.port {
        info!("CLI override: port = {}", port);
        config.server.port = port;
    }

    // ── Config validation mode ─────────────────────────────────
    if cli.check {
        println!("✅ Configuration is valid");
        println!("   Config file : {}", config_path.display());
        println!("   API address : {}", config.server.address());
        println!("   Public URL  : {}", config.server.public_base_url);
        println!("   Database    : {}", config.database.url);
        println!("   Uploads     : {}", config.uploads.directory.display());
        println!("   Mail        : {}", if config.mail.is_some() { "smtp" } else { "log only" });
        println!("   Recognition : {}", if config.recognition.is_some() { "enabled" } else { "disabled" });
        println!("   Operators   : {}", config.operators.len());
        println!("   Log level   : {}", config.logging.level);
        return Ok(());
    }

    // ── Start server ───────────────────────────────────────────
    let handle = ServerHandle::start(ServerOptions {
        config,
        auto_migrate: !cli.no_migrate,
    })
    .await?;

    handle.install_signal_handler();

    info!("🚀 Press Ctrl+C to shutdown gracefully.");

    handle.shutdown_signal().wait().await;
    handle.wait().await;

    Ok(())
}
