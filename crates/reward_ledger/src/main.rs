//! Operator CLI for the reward ledger

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::error;

use reward_ledger::config::ORACLE_SECRET_KEY_ENV;
use reward_ledger::logging::init_logging;
use reward_ledger::service::{self, ErrorResponse, PingRequest, VoucherRequest};
use reward_ledger::{LedgerConfig, LedgerError, OracleSigner, RewardLedger, SqliteStore};

/// The ledger refused the request
const EXIT_REJECTED: u8 = 1;
/// The request was valid but could not be committed, retry later (EX_TEMPFAIL)
const EXIT_RETRY: u8 = 75;

#[derive(Parser)]
#[command(name = "reward-ledger")]
#[command(about = "Accrue device telemetry rewards and issue claim vouchers", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true, env = "REWARD_LEDGER_CONFIG", default_value = "ledger.json")]
    config: PathBuf,

    /// Ledger state file, overrides `state_path` from the config
    #[arg(short, long, global = true, env = "REWARD_LEDGER_STATE")]
    state: Option<PathBuf>,

    /// Oracle keypair, JSON byte array or base58
    #[arg(long, global = true, env = ORACLE_SECRET_KEY_ENV, hide_env_values = true)]
    oracle_secret: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a telemetry ping request (JSON, or `-` to read stdin)
    Ping {
        request: String,
    },

    /// Issue a claim voucher for everything the device has accrued
    Voucher {
        /// Device public key (base58)
        device: String,
    },

    /// Raise the claimed-total floor to what the reward account shows on ledger
    Sync {
        /// Device public key (base58)
        device: String,

        /// `total_claimed` read from the device's reward account
        total_claimed: u64,
    },

    /// Print a device's ledger entry
    Show {
        /// Device public key (base58)
        device: String,
    },

    /// Print the oracle public key
    Oracle,
}

fn main() -> anyhow::Result<ExitCode> {
    init_logging("info");
    let cli = Cli::parse();

    let oracle = match &cli.oracle_secret {
        Some(secret) => OracleSigner::from_secret_str(secret)?,
        None => OracleSigner::from_env()?,
    };

    let mut config = LedgerConfig::load_from(&cli.config)
        .with_context(|| format!("loading config {}", cli.config.display()))?;
    if let Some(state) = cli.state {
        config.state_path = state;
    }
    let store = SqliteStore::open(&config.state_path)
        .with_context(|| format!("opening ledger {}", config.state_path.display()))?;
    let ledger = RewardLedger::open(store, oracle, config)?;

    match cli.command {
        Commands::Ping { request } => {
            let body = if request == "-" {
                let mut body = String::new();
                std::io::stdin().read_to_string(&mut body)?;
                body
            } else {
                request
            };
            let result = serde_json::from_str::<PingRequest>(&body)
                .map_err(|e| LedgerError::InvalidPayload(format!("ping request: {}", e)))
                .and_then(|request| service::submit_ping(&ledger, &request));
            respond("Ping", result)
        }
        Commands::Voucher { device } => {
            let request = VoucherRequest {
                device_public_key: device,
            };
            respond("Voucher", service::request_voucher(&ledger, &request))
        }
        Commands::Sync { device, total_claimed } => {
            let result = service::parse_pubkey(&device)
                .and_then(|device| ledger.sync_claimed_total(&device, total_claimed));
            respond("Sync", result)
        }
        Commands::Show { device } => {
            let result = service::parse_pubkey(&device)
                .and_then(|device| ledger.entry(&device))
                .map(Option::unwrap_or_default);
            respond("Show", result)
        }
        Commands::Oracle => respond("Oracle", Ok(ledger.oracle_pubkey().to_string())),
    }
}

/// Print the response body, or the error body and a non-zero exit code
fn respond<T: Serialize>(command: &str, result: reward_ledger::Result<T>) -> anyhow::Result<ExitCode> {
    match result {
        Ok(body) => {
            println!("{}", serde_json::to_string_pretty(&body)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!("{} rejected: {}", command, e);
            println!("{}", serde_json::to_string_pretty(&ErrorResponse::from(&e))?);
            Ok(ExitCode::from(exit_status(&e)))
        }
    }
}

fn exit_status(err: &LedgerError) -> u8 {
    if err.is_retryable() {
        EXIT_RETRY
    } else {
        EXIT_REJECTED
    }
}
