//! IPPAN Distributor command line
//!
//! Simulates rate-based epoch emission from a configuration file and offers
//! small helpers for reward and identity calculations.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ippan_distributor::{reward_from_supply, Amount, Identity, Rate};
use ippan_distributor_cli::{Simulation, SimulationConfig, SimulationReport};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "ippan-distributor")]
#[command(about = "IPPAN rate-based epoch distributor", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run epochs against an in-memory treasury
    Simulate {
        /// Path to a TOML configuration file
        #[arg(short, long, value_name = "PATH")]
        config: Option<PathBuf>,
        /// Number of epochs (defaults to the configured value)
        #[arg(short, long)]
        epochs: Option<u64>,
        /// Print the full report as JSON
        #[arg(long)]
        json: bool,
        /// Override the configured log level (RUST_LOG takes precedence)
        #[arg(long)]
        log_level: Option<String>,
    },
    /// Compute the per-epoch reward for a rate against a supply
    Reward {
        /// Total supply in base units
        #[arg(long)]
        supply: Amount,
        /// Rate in parts-per-million
        #[arg(long)]
        rate: Rate,
    },
    /// Derive an identity from a label
    Identity {
        label: String,
    },
}

fn init_logging(level: &str, format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if format == "plain" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

fn print_table(report: &SimulationReport) {
    println!("{:>6} {:>10} {:>12}", "epoch", "recipients", "minted");
    for epoch in &report.epochs {
        println!(
            "{:>6} {:>10} {:>12}",
            epoch.epoch,
            epoch.payouts.len(),
            epoch.total_minted
        );
    }
    println!();
    println!("{:>5} {:<14} {:>10} {:>14}", "index", "recipient", "rate", "balance");
    for balance in &report.balances {
        println!(
            "{:>5} {:<14} {:>10} {:>14}",
            balance.index,
            balance.recipient.short(),
            balance.final_rate,
            balance.balance
        );
    }
    println!();
    println!(
        "supply {} -> {} (bounties {})",
        report.initial_supply, report.final_supply, report.bounties
    );
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            config,
            epochs,
            json,
            log_level,
        } => {
            let mut settings = SimulationConfig::load(config.as_deref())?;
            if let Some(level) = log_level {
                settings.log_level = level;
            }
            init_logging(&settings.log_level, &settings.log_format);

            let simulation = Simulation::from_config(&settings)?;
            let report = simulation
                .run(epochs.unwrap_or(settings.epochs))
                .context("simulation aborted")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_table(&report);
            }
        }
        Commands::Reward { supply, rate } => {
            let reward = reward_from_supply(supply, rate)
                .context("reward calculation overflowed")?;
            println!("{reward}");
        }
        Commands::Identity { label } => {
            println!("{}", Identity::derive(&label));
        }
    }

    Ok(())
}
