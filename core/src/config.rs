//! Ledger configuration

use crate::clock::{validate_anchor, validate_sale_period, PeriodAnchor};
use crate::constants::{
    DEFAULT_EVENT_RETENTION, DEFAULT_PAYOUT_FREQUENCY_SECONDS, DEFAULT_SALE_AMOUNT,
    DEFAULT_SALE_PERIOD_SECONDS,
};
use crate::error::{LedgerError, Result};
use crate::payout::validate_payout_frequency;
use crate::sale::validate_sale_amount;
use serde::{Deserialize, Serialize};

/// Address deposits are transferred to when none is configured
pub const DEFAULT_LEDGER_ADDRESS: &str = "compost-ledger";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    /// Only address allowed to change parameters
    #[serde(default)]
    pub owner: String,

    /// Address deposits are transferred to
    #[serde(default = "default_ledger_address")]
    pub address: String,

    /// Start of period 0; defaults to the moment the ledger is created
    #[serde(default)]
    pub deploy_time: Option<u64>,

    /// Where the current period length took over, after a `set_sale_period`.
    /// Requires `deploy_time`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<PeriodAnchor>,

    #[serde(default = "default_sale_period")]
    pub sale_period_seconds: u64,

    #[serde(default = "default_sale_amount", with = "crate::amount")]
    pub sale_amount: u128,

    #[serde(default, with = "crate::amount")]
    pub daily_mint: u128,

    #[serde(default = "default_payout_frequency")]
    pub payout_frequency_seconds: u64,

    /// Newest events kept for pollers and snapshots
    #[serde(default = "default_event_retention")]
    pub event_retention: usize,
}

fn default_ledger_address() -> String {
    DEFAULT_LEDGER_ADDRESS.to_string()
}

fn default_sale_period() -> u64 {
    DEFAULT_SALE_PERIOD_SECONDS
}

fn default_sale_amount() -> u128 {
    DEFAULT_SALE_AMOUNT
}

fn default_payout_frequency() -> u64 {
    DEFAULT_PAYOUT_FREQUENCY_SECONDS
}

fn default_event_retention() -> usize {
    DEFAULT_EVENT_RETENTION
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            owner: String::new(),
            address: default_ledger_address(),
            deploy_time: None,
            anchor: None,
            sale_period_seconds: default_sale_period(),
            sale_amount: default_sale_amount(),
            daily_mint: 0,
            payout_frequency_seconds: default_payout_frequency(),
            event_retention: default_event_retention(),
        }
    }
}

impl LedgerConfig {
    pub fn with_owner(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            ..Self::default()
        }
    }

    /// Same rules the admin setters enforce
    pub fn validate(&self) -> Result<()> {
        if self.owner.trim().is_empty() {
            return Err(LedgerError::InvalidConfig("owner address is required".to_string()));
        }
        if self.address.trim().is_empty() {
            return Err(LedgerError::InvalidConfig("ledger address is required".to_string()));
        }
        validate_sale_period(self.sale_period_seconds)?;
        validate_sale_amount(self.sale_amount)?;
        validate_payout_frequency(self.payout_frequency_seconds)?;
        if self.event_retention == 0 {
            return Err(LedgerError::InvalidConfig(
                "event_retention must be at least 1".to_string(),
            ));
        }
        if let Some(anchor) = self.anchor {
            let deploy_time = self.deploy_time.ok_or_else(|| {
                LedgerError::InvalidConfig("a period anchor requires deploy_time".to_string())
            })?;
            validate_anchor(deploy_time, anchor)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::WAD;

    #[test]
    fn test_defaults() {
        let config = LedgerConfig::with_owner("0xowner");
        assert!(config.validate().is_ok());
        assert_eq!(config.sale_period_seconds, 1_800);
        assert_eq!(config.sale_amount, WAD);
        assert_eq!(config.payout_frequency_seconds, 604_800);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = LedgerConfig::with_owner("0xowner");
        config.sale_period_seconds = 86_401;
        assert!(matches!(
            config.validate(),
            Err(LedgerError::IntervalTooLong { .. })
        ));

        let mut config = LedgerConfig::with_owner("0xowner");
        config.sale_amount = 0;
        assert!(config.validate().is_err());

        let config = LedgerConfig::default();
        assert!(config.validate().is_err());

        let mut config = LedgerConfig::with_owner("0xowner");
        config.event_retention = 0;
        assert!(config.validate().is_err());

        let mut config = LedgerConfig::with_owner("0xowner");
        config.anchor = Some(PeriodAnchor {
            time: 100,
            period: 2,
        });
        assert!(config.validate().is_err());
        config.deploy_time = Some(50);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: LedgerConfig =
            serde_json::from_str(r#"{"owner":"0xowner","sale_amount":"2000000000000000000"}"#)
                .unwrap();
        assert_eq!(config.sale_amount, 2 * WAD);
        assert_eq!(config.address, DEFAULT_LEDGER_ADDRESS);
        assert_eq!(config.deploy_time, None);
        assert_eq!(config.anchor, None);
        assert_eq!(config.event_retention, 10_000);
    }
}
