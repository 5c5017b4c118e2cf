//! Node configuration file
//!
//! ```toml
//! [server]
//! bind = "127.0.0.1:3000"
//! snapshot_path = "data/ledger.json"
//!
//! [ledger]
//! owner = "0xowner"
//! sale_period_seconds = 3600
//! sale_amount = "1000000000000000000"
//!
//! [reputation]
//! "0xalice" = [1, 2]
//!
//! [balances."0xtoken"]
//! "0xalice" = "5000000000000000000"
//! ```

use anyhow::{anyhow, bail, Context, Result};
use compost_core::{LedgerConfig, Share, StaticReputation, TokenBank};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Depositor -> `[numerator, denominator]` of the reward pot
    #[serde(default)]
    pub reputation: BTreeMap<String, [u64; 2]>,

    /// Token -> depositor -> starting balance, approved for the ledger
    #[serde(default)]
    pub balances: BTreeMap<String, BTreeMap<String, SeedAmount>>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,

    /// Ledger state is restored from and saved to this file when set
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            snapshot_path: None,
        }
    }
}

fn default_bind() -> SocketAddr {
    DEFAULT_BIND
        .parse()
        .unwrap_or_else(|_| SocketAddr::from(([127, 0, 0, 1], 3000)))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SeedAmount(#[serde(with = "compost_core::amount")] pub u128);

impl NodeConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: NodeConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.ledger.validate()?;
        for (depositor, [numerator, denominator]) in &self.reputation {
            if Share::new(*numerator as u128, *denominator as u128).is_none() {
                bail!(
                    "reputation share {}/{} for {} must satisfy 0 <= numerator <= denominator, denominator > 0",
                    numerator,
                    denominator,
                    depositor
                );
            }
        }
        Ok(())
    }

    /// In-memory bank seeded from `[balances]`, every balance pre-approved
    /// for transfer to the ledger. Only used for a fresh ledger; see
    /// `restored_token_bank`.
    pub fn token_bank(&self) -> TokenBank {
        let bank = TokenBank::new();
        for (token, holders) in &self.balances {
            for (holder, amount) in holders {
                bank.fund(token, holder, &self.ledger.address, amount.0);
            }
        }
        bank
    }

    /// Bank for a ledger restored from a snapshot. Holdings saved with the
    /// snapshot win over `[balances]`, so seeded funds are never handed out twice.
    pub fn restored_token_bank(&self, saved: Option<serde_json::Value>) -> Result<TokenBank> {
        match saved {
            Some(state) => TokenBank::from_exported(state)
                .map_err(|e| anyhow!("Failed to restore token balances: {}", e)),
            None => {
                tracing::warn!(
                    "Snapshot has no token holdings; seeding balances from the config again"
                );
                Ok(self.token_bank())
            }
        }
    }

    pub fn reputation_oracle(&self) -> StaticReputation {
        let shares: HashMap<String, Share> = self
            .reputation
            .iter()
            .filter_map(|(depositor, [numerator, denominator])| {
                Share::new(*numerator as u128, *denominator as u128)
                    .map(|share| (depositor.clone(), share))
            })
            .collect();
        StaticReputation::new(shares)
    }
}
