//! Compost CLI - query and drive a running node

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "compost-cli")]
#[command(about = "Compost ledger query tool", version)]
struct Cli {
    /// API endpoint
    #[arg(short, long, default_value = "http://localhost:3000")]
    api: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Current period and income summary
    Status,

    /// Outstanding deposits of a token
    Deposits {
        token: String,
    },

    /// Queue a deposit (the node pulls the tokens from the depositor)
    Deposit {
        token: String,
        depositor: String,
        /// Amount in base units
        amount: String,
    },

    /// Sell this period's chunk of a token
    Sell {
        token: String,
    },

    /// Per-period income of completed periods
    Income {
        /// First period to show
        #[arg(long)]
        from: Option<u64>,

        /// Number of periods to show
        #[arg(short, long, default_value = "24")]
        limit: u64,
    },

    /// Events recorded since a cursor
    Events {
        #[arg(short, long, default_value = "0")]
        since: u64,

        /// Most events to fetch
        #[arg(short, long, default_value = "100")]
        limit: u64,
    },
}

struct Client {
    api: String,
    http: reqwest::Client,
}

impl Client {
    async fn get(&self, path: &str) -> Result<Value> {
        let response = self
            .http
            .get(format!("{}{}", self.api, path))
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.api))?;
        Self::into_json(response).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value> {
        let response = self
            .http
            .post(format!("{}{}", self.api, path))
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Failed to reach {}", self.api))?;
        Self::into_json(response).await
    }

    async fn into_json(response: reqwest::Response) -> Result<Value> {
        let status = response.status();
        let body: Value = response.json().await.unwrap_or(Value::Null);
        if !status.is_success() {
            let message = body["message"].as_str().unwrap_or("no details");
            bail!("{} ({})", message, status);
        }
        Ok(body)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = Client {
        api: cli.api.trim_end_matches('/').to_string(),
        http: reqwest::Client::new(),
    };

    match cli.command {
        Commands::Status => {
            let period = client.get("/periods/current").await?;
            let income = client.get("/income/daily").await?;
            let payout = client.get("/payout").await?;

            println!("\nCompost Ledger Status");
            println!("═══════════════════════════════════");
            println!("Current period:   {}", period["current_period"]);
            println!("Periods per day:  {}", period["periods_per_day"]);
            println!("Next period in:   {}s", period["seconds_until_next_period"]);
            println!("Daily income:     {}", text(&income["daily_income"]));
            println!("Next payout in:   {}s", payout["time_to_payout"]);
            println!();
        }

        Commands::Deposits { token } => {
            let body = client.get(&format!("/tokens/{}/deposits", token)).await?;

            println!("\nDeposits of {}", token);
            println!("═══════════════════════════════════");
            if let Some(deposits) = body["deposits"].as_array() {
                for (i, deposit) in deposits.iter().enumerate() {
                    println!(
                        "  {:>3}. {}  {}",
                        i,
                        text(&deposit["depositor"]),
                        text(&deposit["amount"])
                    );
                }
            }
            println!("Outstanding: {}", text(&body["outstanding"]));
            println!();
        }

        Commands::Deposit {
            token,
            depositor,
            amount,
        } => {
            let body = client
                .post(
                    "/deposits",
                    json!({ "token": token, "depositor": depositor, "amount": amount }),
                )
                .await?;
            println!("✓ Deposited, {} in queue", body["num_deposits"]);
        }

        Commands::Sell { token } => {
            let body = client
                .post(&format!("/tokens/{}/sell", token), json!({}))
                .await?;
            println!(
                "✓ Sold {} in period {}, {} deposit(s) remaining",
                text(&body["total"]),
                body["period"],
                body["remaining_deposits"]
            );
        }

        Commands::Income { from, limit } => {
            let mut path = format!("/income/periods?limit={}", limit);
            if let Some(from) = from {
                path.push_str(&format!("&from={}", from));
            }
            let body = client.get(&path).await?;
            let first = body["from"].as_u64().unwrap_or(0);

            println!("\nPeriod income");
            println!("═══════════════════════════════════");
            if let Some(incomes) = body["incomes"].as_array() {
                for (offset, income) in incomes.iter().enumerate() {
                    println!("  {:>6}  {}", first + offset as u64, text(income));
                }
            }
            println!();
        }

        Commands::Events { since, limit } => {
            let body = client
                .get(&format!("/events?since={}&limit={}", since, limit))
                .await?;
            if let Some(events) = body["events"].as_array() {
                for event in events {
                    println!("{:>6}  {}", event["sequence"], event["event"]);
                }
            }
            println!("next cursor: {}", body["next"]);
        }
    }

    Ok(())
}

fn text(value: &Value) -> String {
    value
        .as_str()
        .map(str::to_string)
        .unwrap_or_else(|| value.to_string())
}
