//! feectl: fee engine operator CLI
//!
//! Calibrates fee schedules, prices transactions, and replays transaction
//! batches through the charging agent.

use clap::{Parser, Subcommand};
use fee_engine::calc::ExchangeRate;
use fee_engine::cli::{self, MultiplierChoice};
use fee_engine::txn::{Operation, SubType};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "feectl")]
#[command(version = "0.1.0")]
#[command(about = "Fee schedule calibration and transaction fee charging", long_about = None)]
struct Cli {
    /// Fee configuration file (JSON); defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct RateArgs {
    /// Hbar side of the exchange rate
    #[arg(long, default_value = "1")]
    hbar_equiv: u32,

    /// Cent side of the exchange rate
    #[arg(long, default_value = "12")]
    cent_equiv: u32,
}

#[derive(Subcommand)]
enum Commands {
    /// Calibrate a full fee schedule
    Calibrate {
        /// Calibration data file
        #[arg(long)]
        calibration: PathBuf,

        /// Output schedule file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show one calibrated schedule entry
    Entry {
        /// Calibration data file
        #[arg(long)]
        calibration: PathBuf,

        /// Operation to calibrate, e.g. CryptoTransfer
        #[arg(short, long)]
        function: Operation,

        /// Operation subtype
        #[arg(short, long, default_value = "DEFAULT")]
        subtype: SubType,
    },

    /// Estimate the fee of a transaction
    Price {
        /// Published fee schedule file
        #[arg(short, long)]
        schedule: PathBuf,

        /// Transaction file
        #[arg(short, long)]
        txn: PathBuf,

        #[command(flatten)]
        rate: RateArgs,

        /// Fixed congestion multiplier
        #[arg(
            short,
            long,
            default_value = "1",
            conflicts_with = "utilization",
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        multiplier: u64,

        /// Throttle utilization percentage to derive the multiplier from
        #[arg(short, long)]
        utilization: Option<u32>,
    },

    /// Charge a consensus-ordered batch against a ledger file
    Handle {
        /// Published fee schedule file
        #[arg(short, long)]
        schedule: PathBuf,

        /// Batch file of consensus-ordered transactions
        #[arg(short, long)]
        txns: PathBuf,

        /// Ledger balances file, updated in place
        #[arg(short, long)]
        ledger: PathBuf,

        #[command(flatten)]
        rate: RateArgs,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.command {
        Commands::Calibrate {
            calibration,
            output,
        } => {
            cli::cmd_calibrate(&calibration, &output, config)?;
        }
        Commands::Entry {
            calibration,
            function,
            subtype,
        } => {
            cli::cmd_entry(&calibration, function, subtype)?;
        }
        Commands::Price {
            schedule,
            txn,
            rate,
            multiplier,
            utilization,
        } => {
            let choice = match utilization {
                Some(percent) => MultiplierChoice::Utilization(percent),
                None => MultiplierChoice::Fixed(multiplier),
            };
            let rate = ExchangeRate::new(rate.hbar_equiv, rate.cent_equiv)?;
            cli::cmd_price(&schedule, &txn, rate, choice, config)?;
        }
        Commands::Handle {
            schedule,
            txns,
            ledger,
            rate,
        } => {
            let rate = ExchangeRate::new(rate.hbar_equiv, rate.cent_equiv)?;
            cli::cmd_handle(&schedule, &txns, &ledger, rate, config)?;
        }
    }

    Ok(())
}
