/// LavaNet RPC Harvester - Main Entry Point
///
/// Logs into the points API with every wallet in the wallet file and collects
/// the account's mainnet RPC endpoints into a CSV table.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zeroize::Zeroizing;

use lava_rpc_harvester::{
    config::Config,
    http::{ReqwestTransport, Session, SessionClient},
    orchestrator::{read_wallet_records, HarvestOrchestrator, OrchestratorConfig},
    vault::{self, SymmetricKey},
    EvmWallet, MessageSigner,
};

#[derive(Parser)]
#[command(name = "lava-rpc-harvester")]
#[command(about = "Collects LavaNet mainnet RPC endpoints for a batch of wallets", version)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with every wallet and write the RPC table
    Run {
        /// Configuration file path
        #[arg(short, long, default_value = "harvester.toml")]
        config: PathBuf,

        /// Wallet file override
        #[arg(long)]
        wallets: Option<PathBuf>,

        /// Output file override
        #[arg(long)]
        output: Option<PathBuf>,

        /// Proxy URL override
        #[arg(long)]
        proxy: Option<String>,

        /// Skip failing wallets instead of aborting
        #[arg(long)]
        continue_on_error: bool,

        /// Operator password (prompted when absent)
        #[arg(long, env = "SCRIPT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Encrypt a private key into a wallet file record
    Encrypt {
        /// Hex private key (prompted when absent)
        #[arg(long)]
        private_key: Option<String>,

        /// Operator password (prompted when absent)
        #[arg(long, env = "SCRIPT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// Generate a default configuration file
    Init {
        /// Output path for config file
        #[arg(short, long, default_value = "harvester.toml")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.debug {
        "lava_rpc_harvester=debug"
    } else {
        "lava_rpc_harvester=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Run {
            config,
            wallets,
            output,
            proxy,
            continue_on_error,
            password,
        } => {
            let mut config = load_config(&config)?;
            if let Some(path) = wallets {
                config.run.wallet_path = path;
            }
            if let Some(path) = output {
                config.run.output_path = path;
            }
            if let Some(proxy) = proxy {
                config.api.proxy = proxy;
            }
            config.run.continue_on_error |= continue_on_error;

            let key = operator_key(password)?;
            run(config, key).await?;
        }
        Commands::Encrypt {
            private_key,
            password,
        } => {
            let private_key = match private_key {
                Some(key) => Zeroizing::new(key),
                None => Zeroizing::new(
                    dialoguer::Password::new()
                        .with_prompt("Private key")
                        .interact()?,
                ),
            };
            // Refuse to write records that would fail at login time
            let wallet = EvmWallet::from_private_key_hex(private_key.trim())
                .context("Not a valid secp256k1 private key")?;
            let key = operator_key(password)?;

            info!("Record for {}:", wallet.address());
            println!("{}", vault::encrypt(private_key.trim(), &key));
        }
        Commands::Init { output } => {
            let config = Config::default();
            config.save(&output)?;
            info!("Configuration file created at: {}", output.display());
        }
    }

    Ok(())
}

async fn run(config: Config, key: SymmetricKey) -> Result<()> {
    info!("=== LavaNet RPC Harvester v{} ===", env!("CARGO_PKG_VERSION"));
    info!("API: {}", config.api.base_url);
    if let Some(proxy) = config.api.proxy() {
        info!("Proxy: {}", proxy);
    }

    let records = read_wallet_records(&config.run.wallet_path)?;
    if records.is_empty() {
        bail!("No wallets found in {}", config.run.wallet_path.display());
    }
    info!("Loaded {} encrypted wallets", records.len());

    let transport = ReqwestTransport::new(config.api.proxy(), config.api.request_timeout())?;
    let session = Session::browser(&config.api.browser_profile())?;
    let mut orchestrator = HarvestOrchestrator::new(
        OrchestratorConfig::from_config(&config),
        SessionClient::new(transport),
        session,
    );

    let wallets = orchestrator.unlock_wallets(&records, &key)?;
    drop(key);

    let stats = orchestrator.run(&wallets).await?;
    if stats.wallets_failed > 0 {
        warn!(
            "{} of {} wallets failed, last error: {}",
            stats.wallets_failed,
            stats.wallets_total,
            stats.last_error.as_deref().unwrap_or("unknown")
        );
    }
    info!("RPC data written to {}", config.run.output_path.display());
    Ok(())
}

fn load_config(path: &Path) -> Result<Config> {
    if path.exists() {
        Config::load(path).with_context(|| format!("Failed to load {}", path.display()))
    } else {
        warn!("{} not found, using default configuration", path.display());
        Ok(Config::default())
    }
}

/// Derive the vault key from the operator password. The password itself is
/// dropped (and wiped) before this returns.
fn operator_key(preset: Option<String>) -> Result<SymmetricKey> {
    let password = match preset {
        Some(password) => Zeroizing::new(password),
        None => Zeroizing::new(
            dialoguer::Password::new()
                .with_prompt("Script password")
                .allow_empty_password(true)
                .interact()?,
        ),
    };
    Ok(vault::derive(&password))
}
