//! rai daemon: starts a node and runs it until interrupted.
//!
//! Exit code 0 on clean shutdown; non-zero on fatal initialisation (bad data
//! path, corrupt store, unusable port).

use anyhow::Context;
use clap::{Parser, Subcommand};
use rai_node::{init_logging, LogFormat, Node, NodeConfig};
use rai_types::Network;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rai-daemon", about = "rai block-lattice node")]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long)]
    config: Option<String>,

    /// Network variant: live, beta, or test.
    #[arg(long)]
    network: Option<String>,

    /// Data directory for the ledger store.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Peering port (UDP and TCP).
    #[arg(long)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the node.
    Run,
    /// Print the effective configuration as TOML and exit.
    Config,
    /// Print the address of an account given as 64 hex characters.
    Account { public_key: String },
}

fn parse_network(name: &str) -> anyhow::Result<Network> {
    match name {
        "live" => Ok(Network::Live),
        "beta" => Ok(Network::Beta),
        "test" => Ok(Network::Test),
        other => anyhow::bail!("unknown network {other:?} (expected live, beta, or test)"),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<NodeConfig> {
    let mut config = match &cli.config {
        Some(path) => NodeConfig::from_toml_file(path)
            .with_context(|| format!("loading configuration from {path}"))?,
        None => NodeConfig::default(),
    };
    if let Some(network) = &cli.network {
        config.network = parse_network(network)?;
    }
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(port) = cli.port {
        config.port = Some(port);
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Command::Config => {
            println!("{}", config.to_toml_string());
            Ok(())
        }
        Command::Account { public_key } => {
            let account = rai_types::Account::from_hex(&public_key)
                .context("expected 64 hex characters")?;
            println!(
                "{}",
                rai_crypto::encode_account(&account, config.network.account_prefix())
            );
            Ok(())
        }
        Command::Run => {
            init_logging(LogFormat::from_str(&config.log_format), &config.log_level);
            let node = Node::new(config).context("node initialisation failed")?;

            let runner = {
                let node = node.clone();
                tokio::spawn(async move { node.run().await })
            };

            tokio::signal::ctrl_c()
                .await
                .context("waiting for interrupt")?;
            tracing::info!("interrupt received, shutting down");
            node.stop();
            runner.await.context("node task panicked")??;
            Ok(())
        }
    }
}
