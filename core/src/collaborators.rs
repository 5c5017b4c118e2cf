//! External collaborators consumed by the ledger
//!
//! The ledger never moves tokens or computes reputation itself. It talks to
//! two narrow capabilities:
//! - `TokenTransfer` pulls deposited tokens from the depositor
//! - `ReputationOracle` supplies reputation shares and runs payouts/claims
//!
//! In-memory implementations (`TokenBank`, `StaticReputation`) back the node
//! binary and the test suite.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Insufficient allowance: approved {approved}, required {required}")]
    InsufficientAllowance { approved: u128, required: u128 },

    #[error("Insufficient balance: available {available}, required {required}")]
    InsufficientBalance { available: u128, required: u128 },

    #[error("Token service unavailable: {0}")]
    Unavailable(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("Reputation oracle unavailable: {0}")]
    Unavailable(String),

    #[error("Rejected by reputation oracle: {0}")]
    Rejected(String),
}

/// Token-transfer capability invoked during `deposit_tokens`
pub trait TokenTransfer: Send + Sync {
    fn transfer_from(
        &self,
        token: &str,
        from: &str,
        to: &str,
        amount: u128,
    ) -> Result<(), TransferError>;

    /// Holdings to persist next to the ledger snapshot, when the token
    /// service lives in-process
    fn export_state(&self) -> Option<serde_json::Value> {
        None
    }
}

/// Reputation-weighted payout capability of the colony network
pub trait ReputationOracle: Send + Sync {
    /// Proportional claim of `depositor` on the current reward pot
    fn reputation_share(&self, depositor: &str) -> Result<Share, OracleError>;

    /// Pay out `recipient`'s share of the current reward pot
    fn claim_funds(&self, recipient: &str) -> Result<(), OracleError>;

    /// Open a new reward payout of `amount`, authenticated by `proof`
    fn start_payout(&self, proof: &ReputationProof, amount: u128) -> Result<(), OracleError>;
}

/// Exact fraction of a reward pot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub numerator: u128,
    pub denominator: u128,
}

impl Share {
    pub fn new(numerator: u128, denominator: u128) -> Option<Self> {
        if denominator == 0 || numerator > denominator {
            return None;
        }
        Some(Self {
            numerator,
            denominator,
        })
    }

    pub fn zero() -> Self {
        Self {
            numerator: 0,
            denominator: 1,
        }
    }

    /// Floor of `amount * numerator / denominator`; `None` on overflow
    pub fn apply(&self, amount: u128) -> Option<u128> {
        amount
            .checked_mul(self.numerator)
            .map(|scaled| scaled / self.denominator)
    }
}

/// Reputation-tree inclusion proof, passed through to the oracle untouched
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReputationProof {
    pub key: String,
    pub value: String,
    pub branch_mask: String,
    pub siblings: Vec<String>,
}

/// Serialized form of a `TokenBank`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBankState {
    pub balances: Vec<BalanceEntry>,
    pub allowances: Vec<AllowanceEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    pub token: String,
    pub owner: String,
    #[serde(with = "crate::amount")]
    pub amount: u128,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowanceEntry {
    pub token: String,
    pub owner: String,
    pub spender: String,
    #[serde(with = "crate::amount")]
    pub amount: u128,
}

type BalanceKey = (String, String);
type AllowanceKey = (String, String, String);

/// In-memory token balances and allowances
#[derive(Debug, Default)]
pub struct TokenBank {
    balances: Mutex<HashMap<BalanceKey, u128>>,
    allowances: Mutex<HashMap<AllowanceKey, u128>>,
}

impl TokenBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mint(&self, token: &str, owner: &str, amount: u128) {
        let mut balances = self.balances.lock();
        let balance = balances
            .entry((token.to_string(), owner.to_string()))
            .or_insert(0);
        *balance = balance.saturating_add(amount);
    }

    pub fn approve(&self, token: &str, owner: &str, spender: &str, amount: u128) {
        self.allowances.lock().insert(
            (token.to_string(), owner.to_string(), spender.to_string()),
            amount,
        );
    }

    /// Mint `amount` to `owner` and approve `spender` for all of it
    pub fn fund(&self, token: &str, owner: &str, spender: &str, amount: u128) {
        self.mint(token, owner, amount);
        let approved = self.allowance(token, owner, spender).saturating_add(amount);
        self.approve(token, owner, spender, approved);
    }

    pub fn balance_of(&self, token: &str, owner: &str) -> u128 {
        self.balances
            .lock()
            .get(&(token.to_string(), owner.to_string()))
            .copied()
            .unwrap_or(0)
    }

    pub fn allowance(&self, token: &str, owner: &str, spender: &str) -> u128 {
        self.allowances
            .lock()
            .get(&(token.to_string(), owner.to_string(), spender.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Every balance and allowance, sorted for stable snapshots
    pub fn state(&self) -> TokenBankState {
        let mut balances: Vec<BalanceEntry> = self
            .balances
            .lock()
            .iter()
            .map(|((token, owner), &amount)| BalanceEntry {
                token: token.clone(),
                owner: owner.clone(),
                amount,
            })
            .collect();
        balances.sort_by(|a, b| (&a.token, &a.owner).cmp(&(&b.token, &b.owner)));

        let mut allowances: Vec<AllowanceEntry> = self
            .allowances
            .lock()
            .iter()
            .map(|((token, owner, spender), &amount)| AllowanceEntry {
                token: token.clone(),
                owner: owner.clone(),
                spender: spender.clone(),
                amount,
            })
            .collect();
        allowances.sort_by(|a, b| {
            (&a.token, &a.owner, &a.spender).cmp(&(&b.token, &b.owner, &b.spender))
        });

        TokenBankState {
            balances,
            allowances,
        }
    }

    pub fn from_state(state: TokenBankState) -> Self {
        let bank = Self::new();
        for entry in state.balances {
            bank.mint(&entry.token, &entry.owner, entry.amount);
        }
        for entry in state.allowances {
            bank.approve(&entry.token, &entry.owner, &entry.spender, entry.amount);
        }
        bank
    }

    /// Rebuild from the value `export_state` produced
    pub fn from_exported(value: serde_json::Value) -> crate::error::Result<Self> {
        let state: TokenBankState = serde_json::from_value(value).map_err(|e| {
            crate::error::LedgerError::Snapshot(format!("invalid token bank state: {}", e))
        })?;
        Ok(Self::from_state(state))
    }
}

impl TokenTransfer for TokenBank {
    fn transfer_from(
        &self,
        token: &str,
        from: &str,
        to: &str,
        amount: u128,
    ) -> Result<(), TransferError> {
        let mut allowances = self.allowances.lock();
        let mut balances = self.balances.lock();

        let allowance_key = (token.to_string(), from.to_string(), to.to_string());
        let approved = allowances.get(&allowance_key).copied().unwrap_or(0);
        if approved < amount {
            return Err(TransferError::InsufficientAllowance {
                approved,
                required: amount,
            });
        }

        let from_key = (token.to_string(), from.to_string());
        let available = balances.get(&from_key).copied().unwrap_or(0);
        if available < amount {
            return Err(TransferError::InsufficientBalance {
                available,
                required: amount,
            });
        }

        allowances.insert(allowance_key, approved - amount);
        balances.insert(from_key, available - amount);
        let to_balance = balances
            .entry((token.to_string(), to.to_string()))
            .or_insert(0);
        *to_balance = to_balance.saturating_add(amount);
        Ok(())
    }

    fn export_state(&self) -> Option<serde_json::Value> {
        match serde_json::to_value(self.state()) {
            Ok(value) => Some(value),
            Err(e) => {
                log::error!("Failed to export token bank state: {}", e);
                None
            }
        }
    }
}

#[derive(Debug, Default)]
struct PayoutRound {
    amount: u128,
    claimed: HashSet<String>,
}

/// Fixed reputation shares, typically loaded from the node config
#[derive(Debug, Default)]
pub struct StaticReputation {
    shares: HashMap<String, Share>,
    rounds: Mutex<Vec<PayoutRound>>,
}

impl StaticReputation {
    pub fn new(shares: HashMap<String, Share>) -> Self {
        Self {
            shares,
            rounds: Mutex::new(Vec::new()),
        }
    }

    /// Pot sizes of every payout started so far
    pub fn payouts(&self) -> Vec<u128> {
        self.rounds.lock().iter().map(|r| r.amount).collect()
    }

    pub fn has_claimed(&self, recipient: &str) -> bool {
        self.rounds
            .lock()
            .last()
            .map(|round| round.claimed.contains(recipient))
            .unwrap_or(false)
    }
}

impl ReputationOracle for StaticReputation {
    fn reputation_share(&self, depositor: &str) -> Result<Share, OracleError> {
        self.shares
            .get(depositor)
            .copied()
            .ok_or_else(|| OracleError::Rejected(format!("no reputation for {}", depositor)))
    }

    fn claim_funds(&self, recipient: &str) -> Result<(), OracleError> {
        if !self.shares.contains_key(recipient) {
            return Err(OracleError::Rejected(format!(
                "no reputation for {}",
                recipient
            )));
        }

        let mut rounds = self.rounds.lock();
        let round = rounds
            .last_mut()
            .ok_or_else(|| OracleError::Rejected("no payout in progress".to_string()))?;

        if !round.claimed.insert(recipient.to_string()) {
            return Err(OracleError::Rejected(format!(
                "{} already claimed this payout",
                recipient
            )));
        }
        Ok(())
    }

    fn start_payout(&self, _proof: &ReputationProof, amount: u128) -> Result<(), OracleError> {
        self.rounds.lock().push(PayoutRound {
            amount,
            claimed: HashSet::new(),
        });
        Ok(())
    }
}
