//! chaintrack CLI — replay finalized assertions and inspect the tracker.
//!
//! # Commands
//! ```text
//! chaintrack info
//! chaintrack replay --input <fixture.json> [--config <config.json>] [--from N] [--to N]
//!                   [--address 0x…] [--topic 0x…]...
//! chaintrack tx     --input <fixture.json> --hash <0x…>
//! ```

use std::path::PathBuf;

use alloy_primitives::{Address, B256};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use chaintrack_core::{LogQuery, TrackerConfig};

mod cmd_replay;
mod logging;

#[derive(Parser)]
#[command(
    name = "chaintrack",
    about = "Finalized-assertion tracker — log hash chain, transaction index, log queries",
    version
)]
struct Cli {
    /// Tracker config file (JSON). Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON structured logs
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a fixture and print matching logs as JSON
    Replay {
        /// Replay fixture file
        #[arg(short, long)]
        input: PathBuf,
        /// First height (inclusive)
        #[arg(long, allow_negative_numbers = true)]
        from: Option<i64>,
        /// Last height (inclusive)
        #[arg(long, allow_negative_numbers = true)]
        to: Option<i64>,
        /// Contract address filter
        #[arg(long)]
        address: Option<Address>,
        /// Positional topic filter; repeat for later positions
        #[arg(long)]
        topic: Vec<B256>,
    },

    /// Replay a fixture and print one transaction record as JSON
    Tx {
        /// Replay fixture file
        #[arg(short, long)]
        input: PathBuf,
        /// Message id of the transaction
        #[arg(long)]
        hash: B256,
    },

    /// Show build info and defaults
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config '{}'", path.display()))?;
            TrackerConfig::from_json(&json)?
        }
        None => TrackerConfig::default(),
    };
    if cli.verbose {
        config.log.level = "debug".into();
    }
    if cli.json_logs {
        config.log.json = true;
    }
    logging::init_tracing(&config.log);

    match cli.command {
        Commands::Replay { input, from, to, address, topic } => {
            let query = LogQuery { from_height: from, to_height: to, address, topics: topic };
            cmd_replay::run_logs(&input, &config, query).await
        }
        Commands::Tx { input, hash } => cmd_replay::run_tx(&input, &config, hash).await,
        Commands::Info => cmd_info(&config),
    }
}

fn cmd_info(config: &TrackerConfig) -> Result<()> {
    println!("chaintrack v{}", env!("CARGO_PKG_VERSION"));
    println!("  Instance id:          {}", config.instance_id);
    println!("  Query mailbox:        {} requests", config.query_buffer);
    println!("  Commitment hash:      keccak256 (Solidity-packed)");
    println!("  Outcome decoder:      JSON (replay fixtures)");
    println!("  Storage:              in-memory, unbounded, not persisted");
    Ok(())
}
