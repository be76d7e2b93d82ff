//! Shield CLI - command-line entry point for the Shield gateway

use std::path::PathBuf;

use clap::Parser;
use shield_gateway::{ShieldConfig, ShieldPipeline};

#[derive(Parser)]
#[command(name = "shield")]
#[command(about = "Shield - Active Defense Gateway for AI Agent Interactions")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Start the gateway
    Start {
        /// Configuration file path
        #[arg(short, long, default_value = "config/shield.toml")]
        config: String,

        /// Directory quarantined payloads are written under
        #[arg(long, default_value = "data/quarantine")]
        quarantine_dir: String,
    },
    /// Check configuration validity without serving traffic
    Check {
        /// Configuration file path
        #[arg(short, long, default_value = "config/shield.toml")]
        config: String,
    },
    /// Show gateway status
    Status,
}

fn load_config(path: &str) -> anyhow::Result<ShieldConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read config file {path}: {e}"))?;
    let config: ShieldConfig = toml::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("failed to parse config file {path}: {e}"))?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    match cli.command {
        Some(Commands::Start { config, quarantine_dir }) => {
            let config = load_config(&config)?;
            let pipeline = ShieldPipeline::new(&config, PathBuf::from(&quarantine_dir))?;
            tracing::info!(hostname = %config.hostname, zones = config.zones.len(), "shield gateway starting");
            tracing::info!(up = pipeline.health.report().all_up(), "subsystem health");
            tracing::info!("gateway ready, awaiting shutdown signal");
            tokio::signal::ctrl_c().await?;
            tracing::info!("shutdown signal received, exiting");
        }
        Some(Commands::Check { config }) => {
            let config = load_config(&config)?;
            match ShieldPipeline::new(&config, std::env::temp_dir().join("shield-check")) {
                Ok(_) => println!("config OK: {} zone(s), {} acl(s)", config.zones.len(), config.acls.len()),
                Err(e) => {
                    eprintln!("config INVALID: {e}");
                    std::process::exit(1);
                }
            }
        }
        Some(Commands::Status) => {
            println!("shield gateway: READY");
        }
        None => {
            println!("Shield v0.1.0 - Use --help for commands");
        }
    }

    Ok(())
}
