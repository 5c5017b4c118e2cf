//! JSON snapshots of ledger state
//!
//! A snapshot carries everything the ledger owns except its collaborators,
//! which are supplied again on restore.

use crate::clock::PeriodClock;
use crate::deposits::DepositLedger;
use crate::error::{LedgerError, Result};
use crate::events::EventLog;
use crate::income::IncomeWindow;
use crate::payout::PayoutScheduler;
use crate::sale::SaleEngine;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Bumped whenever the snapshot layout changes incompatibly
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub version: u32,
    pub owner: String,
    pub address: String,
    pub clock: PeriodClock,
    pub deposits: DepositLedger,
    pub sales: SaleEngine,
    pub income: IncomeWindow,
    pub payouts: PayoutScheduler,
    pub events: EventLog,
    /// Holdings of an in-process token service, taken under the same lock
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_state: Option<serde_json::Value>,
}

impl LedgerSnapshot {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        owner: String,
        address: String,
        clock: PeriodClock,
        deposits: DepositLedger,
        sales: SaleEngine,
        income: IncomeWindow,
        payouts: PayoutScheduler,
        events: EventLog,
        token_state: Option<serde_json::Value>,
    ) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            owner,
            address,
            clock,
            deposits,
            sales,
            income,
            payouts,
            events,
            token_state,
        }
    }

    /// Reject snapshots this build cannot interpret, or whose parameters
    /// the admin setters would refuse
    pub fn validate(&self) -> Result<()> {
        if self.version != SNAPSHOT_VERSION {
            return Err(LedgerError::Snapshot(format!(
                "unsupported snapshot version {} (expected {})",
                self.version, SNAPSHOT_VERSION
            )));
        }
        if self.owner.trim().is_empty() {
            return Err(LedgerError::Snapshot("snapshot has no owner".to_string()));
        }
        crate::clock::validate_sale_period(self.clock.sale_period())?;
        crate::sale::validate_sale_amount(self.sales.sale_amount())?;
        crate::payout::validate_payout_frequency(self.payouts.payout_frequency())?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| LedgerError::Snapshot(e.to_string()))
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| LedgerError::Snapshot(e.to_string()))
    }

    /// Write to `path` via a temporary file so a crash never leaves a torn snapshot
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    LedgerError::Snapshot(format!("create {}: {}", parent.display(), e))
                })?;
            }
        }

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, json)
            .map_err(|e| LedgerError::Snapshot(format!("write {}: {}", tmp.display(), e)))?;
        fs::rename(&tmp, path)
            .map_err(|e| LedgerError::Snapshot(format!("rename {}: {}", path.display(), e)))?;

        log::debug!("Snapshot saved to {}", path.display());
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .map_err(|e| LedgerError::Snapshot(format!("read {}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }
}
