//! Chain Sentinel CLI
//!
//! One-shot scans from the terminal. Results are printed as JSON on stdout;
//! logs go to stderr.

use chain_sentinel::core::report::ScanReport;
use chain_sentinel::{build_pipeline, SentinelConfig, WalletWeights};
use clap::{Args, Parser, Subcommand};
use eyre::{eyre, Result, WrapErr};
use serde_json::json;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use chain_sentinel::api::NetworkInfo;
use chain_sentinel::utils::constants::CHAIN_ID_ETHEREUM;
use chain_sentinel::utils::validation::validate_upload;

#[derive(Debug, Parser)]
#[command(
    name = "chain_sentinel",
    version,
    about = "Risk scanner for smart contracts and wallets on EVM networks"
)]
struct Cli {
    /// Log verbosely (overridden by RUST_LOG)
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Probe a network through a freshly verified connection
    Status(StatusArgs),
    /// Scan a Solidity source file
    Contract(ContractArgs),
    /// Scan a wallet's recent activity
    Wallet(WalletArgs),
    /// List configured networks
    Networks,
}

#[derive(Debug, Args)]
struct StatusArgs {
    chain_id: u64,
}

#[derive(Debug, Args)]
struct ContractArgs {
    file: PathBuf,
    #[arg(long, default_value_t = CHAIN_ID_ETHEREUM)]
    chain: u64,
}

#[derive(Debug, Args)]
struct WalletArgs {
    address: String,
    #[arg(long, default_value_t = CHAIN_ID_ETHEREUM)]
    chain: u64,
    /// Weight of the interaction heuristic
    #[arg(long, requires = "ai_weight")]
    heuristic_weight: Option<f64>,
    /// Weight of the AI transaction analysis
    #[arg(long, requires = "heuristic_weight")]
    ai_weight: Option<f64>,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn print_json(value: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let pipeline = build_pipeline(SentinelConfig::from_env());
    let cancel = CancellationToken::new();
    let ctrl_c_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("🛑 Interrupted, cancelling...");
            ctrl_c_token.cancel();
        }
    });

    match cli.command {
        Commands::Status(args) => {
            let report = pipeline.manager().probe_status(args.chain_id).await;
            print_json(&report)?;
            if !report.is_ok() {
                std::process::exit(1);
            }
        }
        Commands::Contract(args) => {
            let source = std::fs::read_to_string(&args.file)
                .wrap_err_with(|| format!("reading {}", args.file.display()))?;
            let filename = args
                .file
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| eyre!("invalid file name: {}", args.file.display()))?;
            validate_upload(filename, &source)?;

            let result = pipeline.score_contract(&source, args.chain, &cancel).await?;
            let report = ScanReport::from_result(&result);
            print_json(&json!({ "result": result, "report": report }))?;
        }
        Commands::Wallet(args) => {
            let weights = match (args.heuristic_weight, args.ai_weight) {
                (Some(heuristic), Some(ai)) => Some(WalletWeights { heuristic, ai }),
                _ => None,
            };
            let result = pipeline
                .score_wallet(&args.address, args.chain, weights, &cancel)
                .await?;
            let report = ScanReport::from_result(&result);
            print_json(&json!({ "result": result, "report": report }))?;
        }
        Commands::Networks => {
            let manager = pipeline.manager();
            let networks: Vec<NetworkInfo> = manager
                .registry()
                .all()
                .into_iter()
                .map(|p| NetworkInfo::new(p, manager.cached_endpoint(p.chain_id)))
                .collect();
            print_json(&networks)?;
        }
    }

    Ok(())
}
