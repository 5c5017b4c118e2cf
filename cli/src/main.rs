//! Compost ledger node
//!
//! Loads the TOML config, restores the ledger from its snapshot when one
//! exists, and serves the HTTP API.

mod config;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use compost_api::ApiState;
use compost_core::{Ledger, LedgerSnapshot, SystemClock, TimeSource};
use config::NodeConfig;
use owo_colors::OwoColorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "compost-node")]
#[command(about = "Period-throttled deposit and sale ledger", version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "compost.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve,

    /// Validate the config file and print the effective ledger settings
    CheckConfig,

    /// Summarise a ledger snapshot
    InspectSnapshot {
        /// Snapshot file; defaults to `server.snapshot_path` from the config
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(&cli.config).await,
        Command::CheckConfig => check_config(&cli.config),
        Command::InspectSnapshot { path } => inspect_snapshot(&cli.config, path),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn serve(config_path: &Path) -> Result<()> {
    init_tracing();

    let config = NodeConfig::load(config_path)?;
    let clock: Arc<dyn TimeSource> = Arc::new(SystemClock);
    let oracle = Arc::new(config.reputation_oracle());

    let ledger = match &config.server.snapshot_path {
        Some(path) if path.exists() => {
            let snapshot = LedgerSnapshot::load(path)?;
            let bank = Arc::new(config.restored_token_bank(snapshot.token_state.clone())?);
            let ledger = Ledger::restore(snapshot, bank, oracle)
                .with_context(|| format!("Failed to restore {}", path.display()))?;
            tracing::info!(
                "Restored ledger from {} ({} events)",
                path.display(),
                ledger.next_event_sequence()
            );
            ledger
        }
        Some(path) => {
            let bank = Arc::new(config.token_bank());
            let ledger = Ledger::new(&config.ledger, clock.now(), bank, oracle)?;
            ledger.snapshot().save(path)?;
            tracing::info!("Created new ledger snapshot at {}", path.display());
            ledger
        }
        None => {
            tracing::warn!("No snapshot_path configured; ledger state is kept in memory only");
            let bank = Arc::new(config.token_bank());
            Ledger::new(&config.ledger, clock.now(), bank, oracle)?
        }
    };

    print_banner(&config, &ledger, clock.now());

    let mut state = ApiState::new(ledger, clock);
    if let Some(path) = &config.server.snapshot_path {
        state = state.with_snapshot_path(path);
    }

    compost_api::start_server(config.server.bind, state)
        .await
        .map_err(|e| anyhow!("API server failed: {}", e))
}

fn print_banner(config: &NodeConfig, ledger: &Ledger, now: u64) {
    let status = ledger.status(now);
    let ledger_config = ledger.config();

    println!("{}", "Compost Ledger Node".cyan().bold());
    println!("{}", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".bright_black());
    println!("{}: {}", "Owner".yellow().bold(), status.owner);
    println!("{}: {}", "Ledger address".yellow().bold(), ledger.address());
    if let Some(deployed) = ledger_config
        .deploy_time
        .and_then(|t| chrono::DateTime::from_timestamp(t as i64, 0))
    {
        println!(
            "{}: {}",
            "Deployed".yellow().bold(),
            deployed.format("%Y-%m-%d %H:%M:%S UTC")
        );
    }
    if let Some(anchor) = ledger_config.anchor {
        println!(
            "{}: period {} from {}",
            "Period clock anchor".yellow().bold(),
            anchor.period,
            anchor.time
        );
    }
    println!(
        "{}: {}s ({} per day), now in period {}",
        "Sale period".yellow().bold(),
        ledger.sale_period(),
        status.periods_per_day,
        status.current_period.to_string().green()
    );
    println!("{}: {}", "Sale amount".yellow().bold(), ledger.sale_amount());
    println!(
        "{}: {} tracked, {} events",
        "Tokens".yellow().bold(),
        status.tracked_tokens,
        status.event_count
    );
    println!(
        "{}: http://{}",
        "Listening".yellow().bold(),
        config.server.bind.to_string().bright_blue()
    );
    println!("{}", "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━".bright_black());
}

fn check_config(config_path: &Path) -> Result<()> {
    let config = NodeConfig::load(config_path)?;

    println!("{} {}", "✓".green(), config_path.display());
    println!("{}", toml::to_string_pretty(&config).context("Failed to render config")?);
    println!(
        "{} reputation entries, {} seeded tokens",
        config.reputation.len(),
        config.balances.len()
    );
    Ok(())
}

fn inspect_snapshot(config_path: &Path, path: Option<PathBuf>) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => NodeConfig::load(config_path)?
            .server
            .snapshot_path
            .ok_or_else(|| anyhow!("No snapshot path given and none configured"))?,
    };

    let snapshot = LedgerSnapshot::load(&path)?;
    snapshot.validate()?;

    println!("{} {}", "Snapshot".cyan().bold(), path.display());
    println!("  version:          {}", snapshot.version);
    println!("  owner:            {}", snapshot.owner);
    println!("  sale period:      {}s", snapshot.clock.sale_period());
    println!("  sale amount:      {}", snapshot.sales.sale_amount());
    println!("  daily mint:       {}", snapshot.payouts.daily_mint());
    println!("  last payout:      {}", snapshot.payouts.last_payout());
    println!("  lifetime income:  {}", snapshot.income.lifetime_income());
    println!(
        "  events:           {} recorded, {} retained",
        snapshot.events.next_sequence(),
        snapshot.events.len()
    );
    println!(
        "  token holdings:   {}",
        if snapshot.token_state.is_some() {
            "persisted"
        } else {
            "not persisted"
        }
    );

    let tokens = snapshot.deposits.tokens();
    println!("  tokens:           {}", tokens.len());
    for token in tokens {
        println!(
            "    {}  {} deposit(s), {} outstanding",
            token,
            snapshot.deposits.num_deposits(&token),
            snapshot.deposits.outstanding(&token)
        );
    }
    Ok(())
}
