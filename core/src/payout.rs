//! Reward payout timing
//!
//! Only the schedule lives here. Reputation shares, the payout itself and
//! claims belong to the external reputation oracle.

use crate::collaborators::Share;
use crate::constants::SECONDS_PER_DAY;
use crate::error::{LedgerError, Result};
use crate::Address;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutScheduler {
    payout_frequency: u64,
    last_payout: u64,
    #[serde(with = "crate::amount")]
    daily_mint: u128,
}

/// Result of a successful claim against the oracle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    pub recipient: Address,
    pub share: Share,
}

impl PayoutScheduler {
    /// The first payout falls due one full cycle after `start`
    pub fn new(start: u64, payout_frequency: u64, daily_mint: u128) -> Result<Self> {
        validate_payout_frequency(payout_frequency)?;
        Ok(Self {
            payout_frequency,
            last_payout: start,
            daily_mint,
        })
    }

    pub fn payout_frequency(&self) -> u64 {
        self.payout_frequency
    }

    pub fn last_payout(&self) -> u64 {
        self.last_payout
    }

    pub fn daily_mint(&self) -> u128 {
        self.daily_mint
    }

    pub fn next_payout_at(&self) -> u64 {
        self.last_payout.saturating_add(self.payout_frequency)
    }

    /// Seconds until the next payout, in `0..=payout_frequency`
    pub fn time_to_payout(&self, now: u64) -> u64 {
        let elapsed = now.saturating_sub(self.last_payout);
        self.payout_frequency.saturating_sub(elapsed)
    }

    pub fn is_due(&self, now: u64) -> bool {
        self.time_to_payout(now) == 0
    }

    /// Reward pot for one cycle: the daily mint scaled to the payout frequency
    pub fn payout_amount(&self) -> Result<u128> {
        self.daily_mint
            .checked_mul(self.payout_frequency as u128)
            .map(|scaled| scaled / SECONDS_PER_DAY as u128)
            .ok_or(LedgerError::ArithmeticOverflow("payout amount"))
    }

    pub fn set_payout_frequency(&mut self, seconds: u64) -> Result<()> {
        validate_payout_frequency(seconds)?;
        self.payout_frequency = seconds;
        Ok(())
    }

    pub fn set_daily_mint(&mut self, amount: u128) {
        self.daily_mint = amount;
    }

    pub(crate) fn mark_paid(&mut self, now: u64) {
        self.last_payout = now;
    }
}

pub fn validate_payout_frequency(seconds: u64) -> Result<()> {
    if seconds == 0 {
        return Err(LedgerError::InvalidConfig(
            "payout frequency must be at least one second".to_string(),
        ));
    }
    Ok(())
}
