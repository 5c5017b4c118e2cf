//! Per-token FIFO deposit queues

use crate::clock::PeriodIndex;
use crate::error::{LedgerError, Result};
use crate::Address;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};

/// A queued, attributed quantity of a token awaiting sale
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub depositor: Address,
    /// Outstanding balance; reduced in place by a partial drain
    #[serde(with = "crate::amount")]
    pub amount: u128,
}

/// Outstanding deposits of one token plus its sale throttle mark
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLedger {
    deposits: VecDeque<Deposit>,
    /// `None` until the first sale
    last_sold_period: Option<PeriodIndex>,
}

impl TokenLedger {
    pub fn len(&self) -> usize {
        self.deposits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deposits.is_empty()
    }

    pub fn deposits(&self) -> impl Iterator<Item = &Deposit> {
        self.deposits.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Deposit> {
        self.deposits.get(index)
    }

    pub fn outstanding(&self) -> u128 {
        self.deposits
            .iter()
            .fold(0u128, |acc, d| acc.saturating_add(d.amount))
    }

    pub fn last_sold_period(&self) -> Option<PeriodIndex> {
        self.last_sold_period
    }

    /// A token may be sold in `period` only if it was last sold earlier
    pub fn can_sell_in(&self, period: PeriodIndex) -> bool {
        self.last_sold_period.map_or(true, |last| last < period)
    }

    pub(crate) fn push(&mut self, deposit: Deposit) {
        self.deposits.push_back(deposit);
    }

    pub(crate) fn mark_sold(&mut self, period: PeriodIndex) {
        self.last_sold_period = Some(period);
    }

    /// Remove the head deposit entirely
    pub(crate) fn pop_front(&mut self) -> Option<Deposit> {
        self.deposits.pop_front()
    }

    /// Reduce the head deposit's balance by `amount`
    pub(crate) fn take_from_front(&mut self, amount: u128) -> Option<u128> {
        let head = self.deposits.front_mut()?;
        head.amount = head.amount.checked_sub(amount)?;
        Some(head.amount)
    }
}

/// Deposit queues for every token the ledger has seen
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositLedger {
    tokens: BTreeMap<String, TokenLedger>,
}

impl DepositLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a deposit to the token's queue. Amount must be non-zero.
    pub fn push(&mut self, token: &str, depositor: &str, amount: u128) -> Result<()> {
        validate_deposit(token, depositor, amount)?;

        self.tokens
            .entry(token.to_string())
            .or_default()
            .push(Deposit {
                depositor: depositor.to_string(),
                amount,
            });
        Ok(())
    }

    pub fn num_deposits(&self, token: &str) -> usize {
        self.tokens.get(token).map(TokenLedger::len).unwrap_or(0)
    }

    /// `index`-th outstanding deposit in sale order
    pub fn get_deposit(&self, token: &str, index: usize) -> Option<&Deposit> {
        self.tokens.get(token).and_then(|ledger| ledger.get(index))
    }

    pub fn deposits(&self, token: &str) -> Vec<Deposit> {
        self.tokens
            .get(token)
            .map(|ledger| ledger.deposits().cloned().collect())
            .unwrap_or_default()
    }

    pub fn outstanding(&self, token: &str) -> u128 {
        self.tokens
            .get(token)
            .map(TokenLedger::outstanding)
            .unwrap_or(0)
    }

    /// Tokens that have ever received a deposit
    pub fn tokens(&self) -> Vec<String> {
        self.tokens.keys().cloned().collect()
    }

    pub fn token(&self, token: &str) -> Option<&TokenLedger> {
        self.tokens.get(token)
    }

    pub(crate) fn token_mut(&mut self, token: &str) -> Option<&mut TokenLedger> {
        self.tokens.get_mut(token)
    }
}

/// Checks shared by `DepositLedger::push` and the ledger's pre-transfer validation
pub fn validate_deposit(token: &str, depositor: &str, amount: u128) -> Result<()> {
    if amount == 0 {
        return Err(LedgerError::InvalidAmount(
            "deposit amount must be greater than zero".to_string(),
        ));
    }
    if token.is_empty() || depositor.is_empty() {
        return Err(LedgerError::InvalidAmount(
            "token and depositor addresses are required".to_string(),
        ));
    }
    Ok(())
}
